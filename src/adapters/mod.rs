//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements          | Connects to                 |
//! |---------------|---------------------|-----------------------------|
//! | `hardware`    | SensorPort          | DS18B20, DHT, switch ladder |
//! |               | ActuatorPort        | LEDC heaters, fan, LED      |
//! |               | DelayNs             | ROM / FreeRTOS delays       |
//! | `eeprom`      | EepromPort          | NVS blob / in-memory region |
//! | `uart`        | Transport           | UART0 USB, UART1 Bluetooth  |
//! | `log_display` | DisplaySink         | Serial log output           |
//! | `time`        |                     | ESP32 system timer          |

pub mod eeprom;
pub mod hardware;
pub mod log_display;
pub mod time;
pub mod uart;

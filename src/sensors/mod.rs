//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns the three channel probes, the board probe and the ambient
//! sensor.  Read failures are logged here and surface to the domain as
//! `None`; the control policy decides what a missing value means.

pub mod ambient;
pub mod probe;

use log::{debug, warn};

use crate::app::ports::AmbientReading;
use crate::config::HardwareProfile;
use crate::control::channels::ChannelId;
use crate::pins;
use ambient::AmbientSensor;
use probe::{BOARD_SLOT, TemperatureProbe};

pub struct SensorHub {
    probes: [TemperatureProbe; 3],
    board: TemperatureProbe,
    ambient: AmbientSensor,
    board_present: bool,
}

impl SensorHub {
    pub fn new(profile: &HardwareProfile) -> Self {
        let bits = profile.resolution_bits();
        Self {
            probes: [
                TemperatureProbe::new(pins::CH1_PROBE_GPIO, ChannelId::Ch1.index(), bits),
                TemperatureProbe::new(pins::CH2_PROBE_GPIO, ChannelId::Ch2.index(), bits),
                TemperatureProbe::new(pins::CH3_PROBE_GPIO, ChannelId::Ch3.index(), bits),
            ],
            board: TemperatureProbe::new(pins::BOARD_PROBE_GPIO, BOARD_SLOT, bits),
            ambient: AmbientSensor::new(pins::DHT_DATA_GPIO, profile.humidity_sensor),
            board_present: false,
        }
    }

    fn probe(&mut self, id: ChannelId) -> &mut TemperatureProbe {
        &mut self.probes[id.index()]
    }

    /// Presence check on one channel bus.  The board probe is re-detected
    /// alongside channel 1.
    pub fn detect(&mut self, id: ChannelId) -> bool {
        if id == ChannelId::Ch1 {
            self.board_present = self.board.detect();
        }
        self.probe(id).detect()
    }

    /// Start conversions on the ch1/ch2 probes and the board probe.
    pub fn request_shared(&mut self) {
        for id in [ChannelId::Ch1, ChannelId::Ch2] {
            self.request(id);
        }
        if let Err(e) = self.board.start_conversion() {
            debug!("board probe: convert failed: {}", e);
        }
    }

    pub fn request(&mut self, id: ChannelId) {
        if let Err(e) = self.probe(id).start_conversion() {
            debug!("probe {:?}: convert failed: {}", id, e);
        }
    }

    pub fn read(&mut self, id: ChannelId) -> Option<f32> {
        self.probe(id)
            .read()
            .inspect_err(|e| warn!("probe {:?}: read failed: {}", id, e))
            .ok()
    }

    pub fn read_board(&mut self) -> Option<f32> {
        self.board
            .read()
            .inspect_err(|e| {
                if self.board_present {
                    warn!("board probe: read failed: {}", e);
                }
            })
            .ok()
    }

    pub fn read_ambient(&mut self) -> AmbientReading {
        self.ambient
            .read()
            .inspect_err(|e| warn!("ambient sensor ({:?}): {}", self.ambient.kind(), e))
            .unwrap_or_default()
    }
}

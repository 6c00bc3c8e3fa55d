//! Log-based display adapter.
//!
//! Implements [`DisplaySink`] by writing each due page to the ESP-IDF
//! logger.  A panel driver would implement the same trait.

use log::info;

use crate::app::ports::DisplaySink;
use crate::control::channels::ChannelId;
use crate::display::{DisplayPage, DisplaySnapshot};

/// Adapter that logs every rendered page.
#[derive(Debug, Default)]
pub struct LogDisplay {
    enabled: bool,
    pages_shown: u32,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_shown(&self) -> u32 {
        self.pages_shown
    }
}

fn shown_or_nan(v: Option<f32>, snap: &DisplaySnapshot) -> f32 {
    v.map_or(f32::NAN, |c| snap.in_unit(c))
}

impl DisplaySink for LogDisplay {
    fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            info!("DISP  | {}", if enabled { "on" } else { "off" });
        }
        self.enabled = enabled;
    }

    fn show(&mut self, page: DisplayPage, snap: &DisplaySnapshot) {
        if !self.enabled {
            return;
        }
        self.pages_shown = self.pages_shown.wrapping_add(1);
        let u = snap.unit_symbol();
        match page {
            DisplayPage::Environment => info!(
                "DISP  | amb={:.1}{u} rh={:.1}% dp={:.1}{u} | mode={:?} offset={} bias={}",
                shown_or_nan(snap.ambient.temperature_c, snap),
                snap.ambient.humidity_pct.unwrap_or(f32::NAN),
                shown_or_nan(snap.ambient.dew_point_c, snap),
                snap.tracking_mode,
                snap.offset,
                snap.ambient_bias,
            ),
            DisplayPage::Channels => {
                for id in ChannelId::ALL {
                    let ch = &snap.channels[id.index()];
                    info!(
                        "DISP  | {:?} {} t={:.1}{u} pwr={}%{}",
                        id,
                        if ch.probe_present { "probe" } else { "-----" },
                        snap.in_unit(ch.temperature_c),
                        ch.power,
                        if ch.override_active { " OVR" } else { "" },
                    );
                }
            }
            DisplayPage::System => info!(
                "DISP  | shadow={:?} fan={}% board={:.0}{u} | v{}",
                snap.shadow_mode,
                snap.fan_speed.percent(),
                shown_or_nan(snap.board_temp_c, snap),
                env!("CARGO_PKG_VERSION"),
            ),
        }
    }
}

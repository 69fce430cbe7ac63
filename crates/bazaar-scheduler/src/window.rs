//! Quiet-hours scheduling: send now if the recipient is inside their active
//! window, otherwise hand the message to the channel with an ETA pointing at
//! the next window opening.
//!
//! All hours are UTC. Converting to the recipient's local time is the
//! frontend's job when the window is configured.

use std::time::Duration;

use bazaar_core::{ActiveWindow, MessageWriter, Result};
use chrono::{Timelike, Utc};

const HOUR_SECS: u64 = 3600;

/// How a message is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Now,
    Later { eta: Duration },
}

/// Stateless; every call is a pure function of the hour and the window plus
/// at most one call on the writer.
pub struct NotificationScheduler;

impl NotificationScheduler {
    /// Whether `hour` falls inside `window`, both ends inclusive.
    pub fn in_window(window: &ActiveWindow, hour: u8) -> bool {
        let from = u32::from(window.from_hour());
        let mut to = u32::from(window.to_hour());
        if to <= from {
            to += 24;
        }
        let mut h = u32::from(hour % 24);
        if h < from {
            h += 24;
        }
        from <= h && h <= to
    }

    /// Seconds from the start of `hour` to the next start of the window.
    pub fn eta_secs(window: &ActiveWindow, hour: u8) -> u64 {
        let from = u64::from(window.from_hour());
        let h = u64::from(hour % 24);
        ((from + 24 - h) % 24) * HOUR_SECS
    }

    /// No window means the recipient accepts messages at any hour.
    pub fn decide(window: Option<&ActiveWindow>, hour: u8) -> Delivery {
        match window {
            Some(w) if !Self::in_window(w, hour) => Delivery::Later {
                eta: Duration::from_secs(Self::eta_secs(w, hour)),
            },
            _ => Delivery::Now,
        }
    }

    pub fn current_hour() -> u8 {
        Utc::now().hour() as u8
    }

    /// Decide and hand the message to `writer`.
    pub async fn deliver(
        writer: &dyn MessageWriter,
        text: &str,
        address: &str,
        window: Option<&ActiveWindow>,
        hour: u8,
    ) -> Result<Delivery> {
        let delivery = Self::decide(window, hour);
        match delivery {
            Delivery::Now => writer.send_now(text, address).await?,
            Delivery::Later { eta } => {
                tracing::debug!(
                    "Deferring {} message to {address} by {}s (hour {hour} outside window)",
                    writer.name(),
                    eta.as_secs()
                );
                writer.send_later(text, address, eta).await?
            }
        }
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(from: u8, to: u8) -> ActiveWindow {
        ActiveWindow::new(from, to).unwrap()
    }

    #[test]
    fn test_normal_range() {
        let day = w(9, 17);
        assert_eq!(NotificationScheduler::decide(Some(&day), 12), Delivery::Now);
        assert!(matches!(NotificationScheduler::decide(Some(&day), 20), Delivery::Later { .. }));
    }

    #[test]
    fn test_wraparound() {
        let night = w(22, 6);
        assert_eq!(NotificationScheduler::decide(Some(&night), 23), Delivery::Now);
        assert_eq!(NotificationScheduler::decide(Some(&night), 3), Delivery::Now);
        assert_eq!(NotificationScheduler::decide(Some(&night), 22), Delivery::Now);
        assert_eq!(NotificationScheduler::decide(Some(&night), 6), Delivery::Now);
        assert!(matches!(NotificationScheduler::decide(Some(&night), 10), Delivery::Later { .. }));
    }

    #[test]
    fn test_boundary_hours() {
        let day = w(9, 17);
        assert_eq!(NotificationScheduler::decide(Some(&day), 9), Delivery::Now);
        assert_eq!(NotificationScheduler::decide(Some(&day), 17), Delivery::Now);
        assert!(matches!(NotificationScheduler::decide(Some(&day), 18), Delivery::Later { .. }));
        assert!(matches!(NotificationScheduler::decide(Some(&day), 8), Delivery::Later { .. }));
    }

    #[test]
    fn test_eta_is_forward_distance_to_window_start() {
        let day = w(9, 17);
        assert_eq!(
            NotificationScheduler::decide(Some(&day), 20),
            Delivery::Later { eta: Duration::from_secs(13 * 3600) }
        );
        assert_eq!(NotificationScheduler::eta_secs(&day, 8), 3600);
        assert_eq!(NotificationScheduler::eta_secs(&day, 0), 9 * 3600);

        let night = w(22, 6);
        assert_eq!(NotificationScheduler::eta_secs(&night, 10), 12 * 3600);
        assert_eq!(NotificationScheduler::eta_secs(&night, 21), 3600);
    }

    #[test]
    fn test_every_deferred_hour_has_positive_eta() {
        for (from, to) in [(9, 17), (22, 6), (0, 0), (23, 1), (5, 4)] {
            let win = w(from, to);
            for hour in 0..24 {
                match NotificationScheduler::decide(Some(&win), hour) {
                    Delivery::Now => assert!(NotificationScheduler::in_window(&win, hour)),
                    Delivery::Later { eta } => {
                        assert!(eta.as_secs() > 0 && eta.as_secs() < 24 * 3600);
                        let reopen = ((u64::from(hour) * 3600 + eta.as_secs()) / 3600) % 24;
                        assert_eq!(reopen, u64::from(from));
                    }
                }
            }
        }
    }

    #[test]
    fn test_equal_bounds_cover_whole_day() {
        let always = w(7, 7);
        assert!((0..24).all(|h| NotificationScheduler::in_window(&always, h)));
    }

    #[test]
    fn test_no_window_is_immediate() {
        assert_eq!(NotificationScheduler::decide(None, 3), Delivery::Now);
    }
}

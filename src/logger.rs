//! Logging helpers.
//!
//! The library itself only emits `tracing` events. Hosts that want them on
//! stderr call [`install_subscriber`] once; [`EventLogger`] is a listener that
//! traces every delivered event.

use crate::event::InputEvent;
use crate::eventbus::InputListener;
use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_directive` when the variable is unset or invalid.
///
/// Returns `false` if a global subscriber was already installed.
pub fn install_subscriber(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

/// A listener that logs every event at `info`.
#[derive(Debug, Default)]
pub struct EventLogger;

impl EventLogger {
    pub fn new() -> Self {
        EventLogger
    }
}

impl InputListener for EventLogger {
    fn on_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::Gamepad(e) => tracing::info!(
                device = %e.device_name,
                oem = %e.oem_name,
                usages = ?e.usages,
                force_feedback = e.force_feedback,
                "gamepad"
            ),
            InputEvent::Mouse(e) => {
                tracing::info!(device = %e.device_name, buttons = ?e.buttons, "mouse")
            }
            InputEvent::KeyDown(e) => {
                tracing::info!(device = %e.device_name, key = ?e.key, "key down")
            }
            InputEvent::KeyUp(e) => tracing::info!(device = %e.device_name, key = ?e.key, "key up"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{GamepadEvent, KeyEvent};
    use crate::keys::Key;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logged(events: &[InputEvent]) -> String {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut logger = EventLogger::new();
            for event in events {
                logger.on_input(event);
            }
        });
        let bytes = capture.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn event_logger_traces_each_event_with_its_fields() {
        let out = logged(&[
            InputEvent::Gamepad(GamepadEvent {
                usages: vec![3, 9],
                device_name: "pad-path".into(),
                oem_name: "Button Box".into(),
                force_feedback: true,
            }),
            InputEvent::KeyDown(KeyEvent {
                device_name: "kbd-path".into(),
                key: Key::Letter('Q'),
            }),
        ]);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2, "{out}");
        assert!(lines[0].contains("INFO") && lines[0].contains("gamepad"), "{out}");
        assert!(lines[0].contains("oem=Button Box"), "{out}");
        assert!(lines[0].contains("usages=[3, 9]"), "{out}");
        assert!(lines[0].contains("force_feedback=true"), "{out}");
        assert!(lines[1].contains("key down") && lines[1].contains("device=kbd-path"), "{out}");
    }

    #[test]
    fn second_global_install_is_refused() {
        install_subscriber("warn");
        assert!(!install_subscriber("debug"));
    }
}

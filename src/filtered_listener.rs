use crate::event::InputEvent;
use crate::eventbus::InputListener;

/// Wraps a listener and filters events based on a user-supplied predicate.
pub struct FilteredListener {
    predicate: Box<dyn Fn(&InputEvent) -> bool + Send + Sync>,
    inner: Box<dyn InputListener>,
}

impl FilteredListener {
    pub fn new(
        predicate: impl Fn(&InputEvent) -> bool + Send + Sync + 'static,
        inner: Box<dyn InputListener>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            inner,
        }
    }

    /// Only gamepad reports whose OEM name equals `name`.
    pub fn for_oem_name(name: impl Into<String>, inner: Box<dyn InputListener>) -> Self {
        let name = name.into();
        Self::new(
            move |e| matches!(e, InputEvent::Gamepad(g) if g.oem_name == name),
            inner,
        )
    }
}

impl InputListener for FilteredListener {
    fn on_input(&mut self, event: &InputEvent) {
        if (self.predicate)(event) {
            self.inner.on_input(event);
        }
    }
}

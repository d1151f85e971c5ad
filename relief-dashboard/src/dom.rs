//! Page surface: element handles, the `View` contract and event bindings.
//!
//! Controllers never look elements up by themselves. They receive the
//! handles they act on through their binding structs and talk to the page
//! only through `View`.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Addressable element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Default element IDs of the dashboard markup.
pub mod ids {
    pub const ALERT_BUTTON: &str = "alert1";
    pub const SHELTER_BUTTON: &str = "shltr";
    pub const ALERTS_SECTION: &str = "alertsSection";
    pub const SHELTER_SECTION: &str = "shelterSection";
    pub const RESOURCE_SECTION: &str = "Resource";
    pub const MAP_CONTAINER: &str = "mapContainer";
    pub const CITY_INPUT: &str = "cityInput";
    pub const RESULTS: &str = "results";
    pub const LOGIN_BOX: &str = "loginBox";
    pub const SIGNUP_BOX: &str = "signupBox";
    pub const SHOW_SIGNUP: &str = "showSignup";
    pub const SHOW_LOGIN: &str = "showLogin";
    pub const LOGIN_EMAIL: &str = "loginEmail";
    pub const LOGIN_PASSWORD: &str = "loginPassword";
    pub const LOGIN_SUBMIT: &str = "loginSubmit";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
}

/// What the controllers need from the page.
pub trait View: Send + Sync {
    fn exists(&self, el: &ElementId) -> bool;
    fn set_visible(&self, el: &ElementId, visible: bool);
    fn set_html(&self, el: &ElementId, html: &str);
    fn scroll_into_view(&self, el: &ElementId, behavior: ScrollBehavior);
    fn value(&self, el: &ElementId) -> Option<String>;
    fn set_value(&self, el: &ElementId, value: &str);
    /// Blocking notice shown to the user (`alert()` on a browser page).
    fn notify(&self, message: &str);
    fn navigate(&self, url: &str);
}

impl<V: View> View for Arc<V> {
    fn exists(&self, el: &ElementId) -> bool {
        (**self).exists(el)
    }
    fn set_visible(&self, el: &ElementId, visible: bool) {
        (**self).set_visible(el, visible)
    }
    fn set_html(&self, el: &ElementId, html: &str) {
        (**self).set_html(el, html)
    }
    fn scroll_into_view(&self, el: &ElementId, behavior: ScrollBehavior) {
        (**self).scroll_into_view(el, behavior)
    }
    fn value(&self, el: &ElementId) -> Option<String> {
        (**self).value(el)
    }
    fn set_value(&self, el: &ElementId, value: &str) {
        (**self).set_value(el, value)
    }
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
    fn navigate(&self, url: &str) {
        (**self).navigate(url)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

struct Binding<A> {
    target: ElementId,
    action: A,
}

/// Click bindings: element -> action, with an explicit subscribe/unsubscribe pair.
///
/// A later subscription on the same element shadows the earlier one until it
/// is unsubscribed.
pub struct EventBindings<A> {
    inner: Mutex<BindingTable<A>>,
}

struct BindingTable<A> {
    next: u64,
    bindings: BTreeMap<SubscriptionId, Binding<A>>,
}

impl<A: Clone> EventBindings<A> {
    pub fn new() -> Self {
        Self { inner: Mutex::new(BindingTable { next: 0, bindings: BTreeMap::new() }) }
    }

    pub fn subscribe(&self, target: ElementId, action: A) -> SubscriptionId {
        let mut table = self.inner.lock();
        table.next += 1;
        let id = SubscriptionId(table.next);
        table.bindings.insert(id, Binding { target, action });
        id
    }

    /// Returns false when the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.lock().bindings.remove(&id).is_some()
    }

    pub fn resolve(&self, target: &ElementId) -> Option<A> {
        self.inner
            .lock()
            .bindings
            .values()
            .rev()
            .find(|b| &b.target == target)
            .map(|b| b.action.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<A: Clone> Default for EventBindings<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_resolve_unsubscribe() {
        let bindings: EventBindings<&'static str> = EventBindings::new();
        let btn = ElementId::from(ids::ALERT_BUTTON);

        let first = bindings.subscribe(btn.clone(), "alerts");
        assert_eq!(bindings.resolve(&btn), Some("alerts"));

        let second = bindings.subscribe(btn.clone(), "override");
        assert_eq!(bindings.resolve(&btn), Some("override"));
        assert_eq!(bindings.len(), 2);

        assert!(bindings.unsubscribe(second));
        assert_eq!(bindings.resolve(&btn), Some("alerts"));
        assert!(!bindings.unsubscribe(second));

        bindings.unsubscribe(first);
        assert_eq!(bindings.resolve(&btn), None);
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_element_id_display() {
        assert_eq!(ElementId::from(ids::RESULTS).to_string(), "results");
    }
}

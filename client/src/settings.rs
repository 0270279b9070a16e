//! Preference persistence. The browser implementation writes the profile to
//! local storage; the controller only sees the [`PreferenceStore`] seam.

use gloo_storage::{LocalStorage, Storage};

use climatlas_shared::prefs::PreferenceProfile;

const PREFERENCES_KEY: &str = "climatlas:preferences";

pub trait PreferenceStore {
    /// Load the stored profile. Missing or corrupt entries fall back to the
    /// defaults instead of erroring.
    fn load(&self) -> PreferenceProfile;
    fn save(&self, prefs: &PreferenceProfile);
}

/// Browser store backed by `window.localStorage`.
#[derive(Debug, Default)]
pub struct LocalPreferenceStore;

impl PreferenceStore for LocalPreferenceStore {
    fn load(&self) -> PreferenceProfile {
        LocalStorage::get(PREFERENCES_KEY).unwrap_or_default()
    }

    fn save(&self, prefs: &PreferenceProfile) {
        if let Err(e) = LocalStorage::set(PREFERENCES_KEY, prefs) {
            crate::logging::warn(&format!("failed to persist preferences: {e}"));
        }
    }
}

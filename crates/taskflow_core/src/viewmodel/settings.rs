//! Appearance settings view-model.

use crate::model::preferences::{AccentColor, Appearance, Preferences, ThemeMode};
use crate::model::query::{TaskFilter, TaskSort};
use crate::repo::settings_repo::SettingsRepository;
use crate::service::settings_service::SettingsService;
use crate::viewmodel::AlertMessage;
use log::warn;

pub struct SettingsViewModel<R: SettingsRepository> {
    service: SettingsService<R>,
    preferences: Preferences,
    alert: Option<AlertMessage>,
}

impl<R: SettingsRepository> SettingsViewModel<R> {
    pub fn new(service: SettingsService<R>) -> Self {
        Self {
            service,
            preferences: Preferences::default(),
            alert: None,
        }
    }

    /// Loads stored preferences. Failures keep the defaults and raise an alert.
    pub fn load(&mut self) {
        match self.service.load_preferences() {
            Ok(preferences) => self.preferences = preferences,
            Err(err) => self.report("load settings", &err),
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn alert(&self) -> Option<&AlertMessage> {
        self.alert.as_ref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn set_theme(&mut self, theme: ThemeMode) {
        match self.service.set_theme(theme) {
            Ok(()) => self.preferences.theme = theme,
            Err(err) => self.report("save theme", &err),
        }
    }

    pub fn set_accent(&mut self, accent: AccentColor) {
        match self.service.set_accent(accent) {
            Ok(()) => self.preferences.accent = accent,
            Err(err) => self.report("save accent color", &err),
        }
    }

    pub fn set_list_preferences(&mut self, filter: TaskFilter, sort: TaskSort) {
        match self.service.set_list_preferences(filter, sort) {
            Ok(()) => {
                self.preferences.filter = filter;
                self.preferences.sort = sort;
            }
            Err(err) => self.report("save list settings", &err),
        }
    }

    pub fn reset(&mut self) {
        match self.service.reset() {
            Ok(()) => self.preferences = Preferences::default(),
            Err(err) => self.report("reset settings", &err),
        }
    }

    pub fn appearance(&self, system_is_dark: bool) -> Appearance {
        self.preferences.theme.resolve(system_is_dark)
    }

    /// Accent `#RRGGBB` for the effective appearance.
    pub fn accent_hex(&self, system_is_dark: bool) -> &'static str {
        self.preferences.accent.hex(self.appearance(system_is_dark))
    }

    fn report(&mut self, action: &str, err: &dyn std::fmt::Display) {
        warn!("event=viewmodel_error module=viewmodel action=\"{action}\" error={err}");
        self.alert = Some(AlertMessage::failure(action, err));
    }
}

//! Preference use cases over the settings repository.
//!
//! Unknown or missing stored values load as defaults; they are never an
//! error, so a bad row cannot block app start.

use crate::model::preferences::{AccentColor, Preferences, ThemeMode};
use crate::model::query::{SortDirection, TaskFilter, TaskSort, TaskSortField};
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::task_repo::RepoResult;
use log::{info, warn};

const KEY_THEME: &str = "appearance.theme";
const KEY_ACCENT: &str = "appearance.accent";
const KEY_FILTER: &str = "list.filter";
const KEY_SORT_FIELD: &str = "list.sort_field";
const KEY_SORT_DIRECTION: &str = "list.sort_direction";

pub struct SettingsService<R: SettingsRepository> {
    repo: R,
}

impl<R: SettingsRepository> SettingsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads every preference, substituting defaults for absent or unknown values.
    pub fn load_preferences(&self) -> RepoResult<Preferences> {
        let defaults = Preferences::default();
        Ok(Preferences {
            theme: self.load(KEY_THEME, ThemeMode::parse)?.unwrap_or(defaults.theme),
            accent: self
                .load(KEY_ACCENT, AccentColor::parse)?
                .unwrap_or(defaults.accent),
            filter: self
                .load(KEY_FILTER, TaskFilter::parse)?
                .unwrap_or(defaults.filter),
            sort: TaskSort {
                field: self
                    .load(KEY_SORT_FIELD, TaskSortField::parse)?
                    .unwrap_or(defaults.sort.field),
                direction: self
                    .load(KEY_SORT_DIRECTION, SortDirection::parse)?
                    .unwrap_or(defaults.sort.direction),
            },
        })
    }

    pub fn set_theme(&self, theme: ThemeMode) -> RepoResult<()> {
        self.repo.set_setting(KEY_THEME, theme.as_str())?;
        info!(
            "event=settings_update module=service status=ok key={KEY_THEME} value={}",
            theme.as_str()
        );
        Ok(())
    }

    pub fn set_accent(&self, accent: AccentColor) -> RepoResult<()> {
        self.repo.set_setting(KEY_ACCENT, accent.as_str())?;
        info!(
            "event=settings_update module=service status=ok key={KEY_ACCENT} value={}",
            accent.as_str()
        );
        Ok(())
    }

    /// Persists the list filter and sort chosen by the user.
    pub fn set_list_preferences(&self, filter: TaskFilter, sort: TaskSort) -> RepoResult<()> {
        self.repo.set_settings(&[
            (KEY_FILTER, filter.as_str()),
            (KEY_SORT_FIELD, sort.field.as_str()),
            (KEY_SORT_DIRECTION, sort.direction.as_str()),
        ])?;
        info!(
            "event=settings_update module=service status=ok key=list filter={} sort_field={} sort_direction={}",
            filter.as_str(),
            sort.field.as_str(),
            sort.direction.as_str()
        );
        Ok(())
    }

    /// Drops every stored preference so defaults apply again.
    pub fn reset(&self) -> RepoResult<()> {
        for key in [
            KEY_THEME,
            KEY_ACCENT,
            KEY_FILTER,
            KEY_SORT_FIELD,
            KEY_SORT_DIRECTION,
        ] {
            self.repo.remove_setting(key)?;
        }
        Ok(())
    }

    fn load<T>(&self, key: &str, parse: impl Fn(&str) -> Option<T>) -> RepoResult<Option<T>> {
        let Some(raw) = self.repo.get_setting(key)? else {
            return Ok(None);
        };
        let parsed = parse(raw.as_str());
        if parsed.is_none() {
            warn!("event=settings_load module=service status=fallback key={key}");
        }
        Ok(parsed)
    }
}

// SPDX-FileCopyrightText: 2026 Stockroom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application-wide UI state: sidebar, theme preference, signed-in session.
//!
//! One [`AppState`] is constructed at startup and handed to whoever needs
//! it; there is no global instance.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Theme preference chosen by the user.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the operating system preference.
    #[default]
    System,
}

/// The signed-in administrator.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: String,
    token: SecretString,
}

impl Session {
    pub fn new(user: impl Into<String>, token: SecretString) -> Self {
        Self {
            user: user.into(),
            token,
        }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Explicit holder for the dashboard's UI flags and auth session.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    sidebar_collapsed: bool,
    theme: Theme,
    session: Option<Session>,
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The bearer token to attach to backend calls, if signed in.
    pub fn bearer_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.expose_secret())
    }

    /// Resolves [`Theme::System`] against the OS preference.
    pub fn effective_theme(&self, system_prefers_dark: bool) -> Theme {
        match self.theme {
            Theme::System if system_prefers_dark => Theme::Dark,
            Theme::System => Theme::Light,
            other => other,
        }
    }

    /// Flips the sidebar and returns the new collapsed state.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_collapsed = !self.sidebar_collapsed;
        self.sidebar_collapsed
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn sign_in(&mut self, session: Session) {
        self.session = Some(session);
    }

    /// Drops the session. Returns true if one existed, in which case the
    /// caller should clear every cached list.
    pub fn sign_out(&mut self) -> bool {
        self.session.take().is_some()
    }
}

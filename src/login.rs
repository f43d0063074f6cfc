// src/login.rs

use crate::errors::AgentResult;
use crate::models::AuthUser;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

/// Login form state. Validation here is cosmetic; the auth provider decides.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub errors: FieldErrors,
    /// Provider error text from the last failed sign-in, shown verbatim.
    pub auth_error: Option<String>,
    pub submitting: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: String::new(),
            password: String::new(),
            focus: LoginField::Email,
            errors: FieldErrors::default(),
            auth_error: None,
            submitting: false,
        }
    }
}

impl LoginForm {
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn push_char(&mut self, c: char) {
        self.focused_value().push(c);
        self.clear_focused_error();
    }

    pub fn pop_char(&mut self) {
        self.focused_value().pop();
        self.clear_focused_error();
    }

    fn focused_value(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    // Editing a field clears its error.
    fn clear_focused_error(&mut self) {
        match self.focus {
            LoginField::Email => self.errors.email = None,
            LoginField::Password => self.errors.password = None,
        }
    }

    pub fn validate(&mut self) -> bool {
        let mut errors = FieldErrors::default();

        if self.email.is_empty() {
            errors.email = Some("Email is required".to_string());
        } else if !EMAIL_SHAPE.is_match(&self.email) {
            errors.email = Some("Email is invalid".to_string());
        }

        if self.password.is_empty() {
            errors.password = Some("Password is required".to_string());
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    /// Validates and marks the form as submitting. Returns the credentials to
    /// sign in with, or `None` when invalid or a sign-in is already running.
    pub fn begin_submit(&mut self) -> Option<(String, String)> {
        if self.submitting || !self.validate() {
            return None;
        }
        self.submitting = true;
        self.auth_error = None;
        Some((self.email.trim().to_string(), self.password.clone()))
    }

    /// Applies the sign-in result. Returns `true` when the user is signed in.
    pub fn finish_submit(&mut self, result: &AgentResult<AuthUser>) -> bool {
        self.submitting = false;
        match result {
            Ok(_) => {
                self.password.clear();
                self.auth_error = None;
                true
            }
            Err(e) => {
                self.auth_error = Some(e.to_string());
                false
            }
        }
    }
}

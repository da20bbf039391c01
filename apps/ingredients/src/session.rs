//! Authentication gate.

/// Whether the user has logged in
///
/// `login` is the only mutation; there is no logout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
}

impl Session {
    /// An unauthenticated session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            authenticated: false,
        }
    }

    /// Mark the session authenticated
    pub fn login(&mut self) {
        if !self.authenticated {
            tracing::info!("Session authenticated");
        }
        self.authenticated = true;
    }

    /// Whether [`login`](Self::login) has been called
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// What the front-end shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// The login prompt
    Auth,
    /// The ingredient list
    Ingredients,
}

/// Application shell owning the session
#[derive(Clone, Debug, Default)]
pub struct App {
    session: Session,
}

impl App {
    /// Start unauthenticated
    #[must_use]
    pub const fn new() -> Self {
        Self {
            session: Session::new(),
        }
    }

    /// The current session
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Log in
    pub fn login(&mut self) {
        self.session.login();
    }

    /// The screen for the current session
    #[must_use]
    pub const fn screen(&self) -> Screen {
        if self.session.is_authenticated() {
            Screen::Ingredients
        } else {
            Screen::Auth
        }
    }
}

//! HTTP API for roster.
//!
//! Routes:
//!
//! | method | path                 | handler                      |
//! |--------|----------------------|------------------------------|
//! | GET    | `/`                  | [`handlers::home`]           |
//! | GET    | `/api/users/`        | [`handlers::list_users`]     |
//! | POST   | `/api/users/`        | [`handlers::create_user`]    |
//! | GET    | `/api/users/:email`  | [`handlers::get_user`]       |
//! | DELETE | `/api/users/:email`  | [`handlers::delete_user`]    |
//! | PATCH  | `/api/users/:email`  | [`handlers::update_user`]    |

pub mod handlers;
pub mod middleware;
pub mod response;

use std::sync::Arc;

use async_std::sync::Mutex;
use tracing::{info, warn};

use crate::args::{UserArgs, Validator};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::user::User;

pub use middleware::RequestLogger;

/// State shared by every request.
///
/// The single `SQLite` connection is guarded by an async mutex; each
/// operation takes the lock once so that multi-step operations are atomic
/// with respect to other requests.
#[derive(Debug, Clone)]
pub struct State {
    storage: Arc<Mutex<Storage>>,
    validator: Arc<Validator>,
    debug: bool,
}

impl State {
    /// Create state around an open storage.
    #[must_use]
    pub fn new(storage: Storage, validator: Validator, debug: bool) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            validator: Arc::new(validator),
            debug,
        }
    }

    /// Open storage and build the validator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the validation
    /// rules are invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        let validator = Validator::from_config(&config.validation)?;
        Ok(Self::new(storage, validator, config.server.debug))
    }

    /// Whether server errors expose their details.
    #[must_use]
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Every user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.storage.lock().await.list()
    }

    /// Validate and insert a user, returning every user afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the email is taken, or the
    /// database operation fails.
    pub async fn create_user(&self, args: &UserArgs) -> Result<Vec<User>> {
        let new_user = self.validator.validate(args)?;
        let storage = self.storage.lock().await;
        let user = storage.insert(&new_user)?;
        info!("Created user {} ({})", user.email, user.id);
        storage.list()
    }

    /// Look up a user by email.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UserNotFound`] if there is no such user.
    pub async fn get_user(&self, email: &str) -> Result<User> {
        self.storage
            .lock()
            .await
            .get_by_email(email)?
            .ok_or_else(|| Error::user_not_found(email))
    }

    /// Validate arguments and update the names of an existing user.
    ///
    /// All three arguments are required, but only the names are applied; the
    /// stored email never changes.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or there is no such user.
    pub async fn update_user(&self, email: &str, args: &UserArgs) -> Result<User> {
        let fields = self.validator.validate(args)?;
        if fields.email != email {
            warn!(
                "Ignoring email {} in update for {}; emails cannot be changed",
                fields.email, email
            );
        }
        self.storage
            .lock()
            .await
            .update_names(email, &fields.first_name, &fields.last_name)?
            .ok_or_else(|| Error::user_not_found(email))
    }

    /// Delete a user by email.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UserNotFound`] if there is no such user.
    pub async fn delete_user(&self, email: &str) -> Result<()> {
        if self.storage.lock().await.delete_by_email(email)? {
            Ok(())
        } else {
            Err(Error::user_not_found(email))
        }
    }
}

/// Build the application with all routes registered.
#[must_use]
pub fn app(state: State) -> tide::Server<State> {
    let mut app = tide::with_state(state);
    app.with(RequestLogger);

    app.at("/").get(handlers::home);
    for collection in ["/api/users", "/api/users/"] {
        app.at(collection)
            .get(handlers::list_users)
            .post(handlers::create_user);
    }
    app.at("/api/users/:email")
        .get(handlers::get_user)
        .delete(handlers::delete_user)
        .patch(handlers::update_user);

    app
}

/// Open storage from `config` and serve until the listener fails.
///
/// # Errors
///
/// Returns an error if storage cannot be opened or the address cannot be bound.
pub async fn serve(config: &Config) -> Result<()> {
    let state = State::from_config(config)?;
    let addr = config.bind_addr().to_string();

    if state.debug() {
        warn!("Debug mode is on; server errors will include details");
    }
    info!(
        "Serving roster on http://{} (database {})",
        addr,
        config.database_path().display()
    );

    app(state)
        .listen(addr.clone())
        .await
        .map_err(|source| Error::Serve { addr, source })
}

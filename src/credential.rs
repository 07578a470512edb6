//! Password credential lifecycle: hashing new passwords into the user directory
//! and checking login attempts against what's stored there.
//!
//! Hash computation is deliberately slow, so it always runs on the blocking
//! worker pool and never on a request task.
use {
    crate::{
        directory::{
            PutRes,
            UserDirectory,
        },
        hash,
        interface::{
            config::HashScheme,
            user::StoredCredential,
        },
    },
    loga::{
        ea,
        ErrContext,
        Log,
    },
    std::sync::Arc,
    tokio::sync::OnceCell,
};

/// Hashed on first use to give lookups of unknown users the same cost as real
/// checks.
const DECOY_PASSWORD: &str = "decoy password for unknown users";

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("User name is empty")]
    EmptyName,
    #[error("Password is empty")]
    EmptyPassword,
    #[error("Password hash computation failed: {0}")]
    HashingFailure(loga::Error),
    #[error("User directory failed: {0}")]
    Directory(loga::Error),
}

impl CredentialError {
    /// Unwrap into a loga error for logging, keeping the inner context chain.
    pub fn into_loga(self) -> loga::Error {
        match self {
            CredentialError::HashingFailure(e) => return e.context("Password hash computation failed"),
            CredentialError::Directory(e) => return e.context("User directory failed"),
            other => return loga::err(other.to_string()),
        }
    }
}

#[derive(Debug)]
pub enum RegisterRes {
    Registered(StoredCredential),
    /// The directory already holds a user with this name.
    NameTaken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyRes {
    Match,
    Mismatch,
    UserNotFound,
}

pub struct CredentialManager {
    log: Log,
    directory: Arc<dyn UserDirectory>,
    scheme: HashScheme,
    decoy_hash: OnceCell<String>,
}

async fn offload<
    T: Send + 'static,
>(f: impl FnOnce() -> Result<T, loga::Error> + Send + 'static) -> Result<T, CredentialError> {
    match tokio::task::spawn_blocking(f).await {
        Ok(r) => return r.map_err(CredentialError::HashingFailure),
        Err(e) => return Err(CredentialError::HashingFailure(e.context("Hashing worker did not complete"))),
    }
}

impl CredentialManager {
    pub fn new(log: &Log, directory: Arc<dyn UserDirectory>, scheme: HashScheme) -> Self {
        return Self {
            log: log.clone(),
            directory: directory,
            scheme: scheme,
            decoy_hash: OnceCell::new(),
        };
    }

    /// Compute the decoy hash up front so the first lookup of an unknown user costs
    /// the same as later ones.
    pub async fn prepare(&self) -> Result<(), CredentialError> {
        self.decoy().await?;
        return Ok(());
    }

    async fn decoy(&self) -> Result<&String, CredentialError> {
        return self.decoy_hash.get_or_try_init(|| {
            let scheme = self.scheme;
            offload(move || hash::hash_password(scheme, DECOY_PASSWORD))
        }).await;
    }

    /// Hash `password` with a fresh salt and hand the result to the directory.
    /// Duplicate names are the directory's call; the in-memory one keeps the
    /// first registration.
    pub async fn register(&self, name: &str, password: &str) -> Result<RegisterRes, CredentialError> {
        if name.is_empty() {
            return Err(CredentialError::EmptyName);
        }
        if password.is_empty() {
            return Err(CredentialError::EmptyPassword);
        }
        let password_hash = offload({
            let scheme = self.scheme;
            let password = password.to_string();
            move || hash::hash_password(scheme, &password)
        }).await?;
        let credential = StoredCredential {
            name: name.to_string(),
            password_hash: password_hash,
        };
        match self.directory.put(credential.clone()).await.map_err(CredentialError::Directory)? {
            PutRes::Stored => {
                self.log.log_with(loga::DEBUG, "Registered user", ea!(user = name));
                return Ok(RegisterRes::Registered(credential));
            },
            PutRes::Exists => {
                self.log.log_with(loga::DEBUG, "Registration rejected, name taken", ea!(user = name));
                return Ok(RegisterRes::NameTaken);
            },
        }
    }

    /// Check `password` against the hash stored for `name`. Never mutates the
    /// directory.
    pub async fn verify(&self, name: &str, password: &str) -> Result<VerifyRes, CredentialError> {
        let Some(credential) = self.directory.get(name).await.map_err(CredentialError::Directory)? else {
            self.burn_decoy(password).await;
            self.log.log_with(loga::DEBUG, "Login for unknown user", ea!(user = name));
            return Ok(VerifyRes::UserNotFound);
        };
        let matched = offload({
            let password = password.to_string();
            move || hash::verify_password(&password, &credential.password_hash)
        }).await?;
        if matched {
            self.log.log_with(loga::DEBUG, "Login succeeded", ea!(user = name));
            return Ok(VerifyRes::Match);
        } else {
            self.log.log_with(loga::DEBUG, "Login password mismatch", ea!(user = name));
            return Ok(VerifyRes::Mismatch);
        }
    }

    /// Names of all registered users.
    pub async fn list(&self) -> Result<Vec<String>, CredentialError> {
        return self.directory.list().await.map_err(CredentialError::Directory);
    }

    async fn burn_decoy(&self, password: &str) {
        let decoy = match self.decoy().await {
            Ok(d) => d.clone(),
            Err(e) => {
                self.log.log_err(loga::WARN, e.into_loga().context("Error preparing decoy hash"));
                return;
            },
        };
        let password = password.to_string();
        if let Err(e) = offload(move || hash::verify_password(&password, &decoy)).await {
            self.log.log_err(loga::WARN, e.into_loga().context("Error checking decoy hash"));
        }
    }
}

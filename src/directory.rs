use {
    crate::{
        hash,
        interface::user::StoredCredential,
    },
    async_trait::async_trait,
    std::collections::{
        btree_map::Entry,
        BTreeMap,
    },
    loga::{
        ea,
        ResultContext,
    },
    tokio::sync::Mutex,
};

pub enum PutRes {
    Stored,
    /// A credential with the same name is already present and was left as is.
    Exists,
}

/// Name to credential mapping. Implementations decide durability and are
/// responsible for allowing at most one successful `put` per name.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<StoredCredential>, loga::Error>;
    async fn put(&self, credential: StoredCredential) -> Result<PutRes, loga::Error>;
    /// All registered names, in no particular order.
    async fn list(&self) -> Result<Vec<String>, loga::Error>;
}

/// Volatile in-process directory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryDirectory {
    users: Mutex<BTreeMap<String, StoredCredential>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        return Self::default();
    }

    /// Build a directory pre-populated with already hashed users. Every hash must
    /// be one `verify_password` can check.
    pub fn seeded(users: impl IntoIterator<Item = StoredCredential>) -> Result<Self, loga::Error> {
        let mut out = BTreeMap::new();
        for user in users {
            if user.name.is_empty() {
                return Err(loga::err("Seed user has an empty name"));
            }
            hash::check_stored(
                &user.password_hash,
            ).context_with("Seed user has an unusable password hash", ea!(user = user.name))?;
            match out.entry(user.name.clone()) {
                Entry::Occupied(_) => {
                    return Err(loga::err(format!("Duplicate seed user [{}]", user.name)));
                },
                Entry::Vacant(e) => {
                    e.insert(user);
                },
            }
        }
        return Ok(Self { users: Mutex::new(out) });
    }
}

#[async_trait]
impl UserDirectory for MemoryDirectory {
    async fn get(&self, name: &str) -> Result<Option<StoredCredential>, loga::Error> {
        return Ok(self.users.lock().await.get(name).cloned());
    }

    async fn put(&self, credential: StoredCredential) -> Result<PutRes, loga::Error> {
        match self.users.lock().await.entry(credential.name.clone()) {
            Entry::Occupied(_) => return Ok(PutRes::Exists),
            Entry::Vacant(e) => {
                e.insert(credential);
                return Ok(PutRes::Stored);
            },
        }
    }

    async fn list(&self) -> Result<Vec<String>, loga::Error> {
        return Ok(self.users.lock().await.keys().cloned().collect());
    }
}

pub mod credential;
pub mod directory;
pub mod handlers;
pub mod hash;
pub mod state;

pub mod interface {
    pub mod config;
    pub mod user;
}

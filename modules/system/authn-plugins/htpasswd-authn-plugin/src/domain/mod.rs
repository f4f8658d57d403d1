pub mod hash;
pub mod htpasswd;
pub mod secret_store;

//! Cart session plumbing for the CLI.
//!
//! An anonymous session persists its cookie jar to a JSON file so the cart
//! survives between invocations, the same way a browser cart survives page
//! loads. An authenticated session talks to the backend configured through
//! `MANIPI_API_BASE_URL`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use cookie::Cookie;
use url::Url;

use manipi_cart::csrf::resolve_token_with_cookies;
use manipi_cart::{
    CartAction, CartConfig, CartStateManager, CookieStore, CookieWriteError, SessionContext,
    TracingSink,
};

/// Backend origin used when `MANIPI_API_BASE_URL` is not set (anonymous
/// sessions never contact it).
const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000/";

/// A cart manager wired to CLI-appropriate storage and output.
pub struct CartSession {
    manager: CartStateManager,
}

impl CartSession {
    /// Build the session: load the jar file, resolve the CSRF token, and
    /// construct the manager for the requested auth mode.
    pub fn open(
        authenticated: bool,
        csrf_token: Option<&str>,
        cookie_path: PathBuf,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let jar = Arc::new(FileCookies::load(cookie_path));

        let config = match CartConfig::from_env() {
            Ok(config) => config,
            Err(_) if !authenticated => CartConfig::new(Url::parse(DEFAULT_API_BASE)?),
            Err(e) => return Err(e.into()),
        };

        let context = if authenticated {
            // The --csrf-token flag plays the role of the page config
            // object; the jar file stands in for browser cookies.
            let token = resolve_token_with_cookies(csrf_token, None, jar.as_ref());
            SessionContext::authenticated(token)
        } else {
            SessionContext::anonymous()
        };

        let manager = CartStateManager::new(&context, &config, jar, Arc::new(TracingSink))?;
        Ok(Self { manager })
    }

    pub async fn add(
        &self,
        product_id: &str,
        variant: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let action = match variant {
            Some(variant) => CartAction::add_variant(product_id, variant),
            None => CartAction::add(product_id),
        };
        self.manager.mutate(action).await?;
        Ok(())
    }

    pub async fn remove(
        &self,
        product_id: &str,
        variant: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let action = match variant {
            Some(variant) => CartAction::remove_variant(product_id, variant),
            None => CartAction::remove(product_id),
        };
        self.manager.mutate(action).await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        product_id: &str,
        variant: Option<&str>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let action = match variant {
            Some(variant) => CartAction::delete_variant(product_id, variant),
            None => CartAction::delete(product_id),
        };
        self.manager.mutate(action).await?;
        Ok(())
    }

    /// Print the cart's lines (anonymous) and aggregate.
    #[allow(clippy::print_stdout)]
    pub fn show(&self) {
        if let Some(store) = self.manager.local_store() {
            if store.is_empty() {
                println!("cart is empty");
            } else {
                let mut lines: Vec<_> = store.lines().collect();
                lines.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
                for (key, line) in lines {
                    println!("{key}  x{}", line.quantity);
                }
            }
        }

        match self.manager.aggregate() {
            Some(aggregate) => {
                println!("items: {}", aggregate.item_count);
                if let Some(total) = aggregate.total {
                    println!("total: {total}");
                }
            }
            None => println!("no cart summary yet (authenticated carts update on first mutation)"),
        }
    }

    pub fn clear(&self) {
        self.manager.clear();
    }
}

/// Cookie store persisted to a JSON file, so anonymous carts survive between
/// CLI invocations the way browser carts survive page loads.
struct FileCookies {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileCookies {
    /// Load the jar; a missing or malformed file starts empty.
    fn load(path: PathBuf) -> Self {
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self {
            path,
            values: Mutex::new(values),
        }
    }
}

impl CookieStore for FileCookies {
    fn get(&self, name: &str) -> Option<String> {
        let values = self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        values.get(name).cloned()
    }

    fn set(&self, cookie: Cookie<'static>) -> Result<(), CookieWriteError> {
        let mut values = self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        values.insert(cookie.name().to_owned(), cookie.value().to_owned());

        let encoded = serde_json::to_string_pretty(&*values).map_err(|e| CookieWriteError {
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, encoded).map_err(|e| CookieWriteError {
            reason: e.to_string(),
        })
    }
}

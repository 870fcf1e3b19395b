//! Envelope inspection command.
//!
//! Opens a `data` query value the way a receiving device would. Handy for
//! checking what a server actually got.
//!
//! # Examples
//!
//! ```bash
//! barkcast decrypt --key XXXXXXXX 'AAAAAAAAAAAAAAAA:<tag>:<ciphertext>'
//! ```

use anyhow::Result;

use crate::crypto;

/// Decrypts `data` with `push_key` and prints the title and body.
pub fn run(push_key: &str, data: &str) -> Result<()> {
    let content = crypto::decrypt(push_key, data.trim())?;
    println!("title: {}", content.title);
    println!("body:  {}", content.body);
    Ok(())
}

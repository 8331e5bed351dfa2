// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Fly.io macaroon bundles.
//!
//! A token handed to a machine is a *bundle*: an `Authorization` header value
//! holding one or more macaroons. Each macaroon is a MessagePack record of a
//! nonce, a target location, a caveat set and a signature tail.
//!
//! This crate decodes bundles and exposes their caveats. It does **not**
//! verify signatures: there is no root key on the client. Caveats read here
//! are only ever used to narrow what a client asks for; the service that owns
//! the location verifies the token.
//!
//! ```text
//! FlyV1 fm2_<base64 msgpack>,fm2_<base64 msgpack>
//! ```
//!
//! # Example
//!
//! ```
//! use fly_macaroon::{app_scope, Bundle, Caveat, CaveatSet, Macaroon, Nonce};
//!
//! let location = "https://api.fly.io/secrets/v1";
//! let mut mac = Macaroon::new(location, Nonce::new(b"kid".to_vec(), b"rnd".to_vec()));
//! mac.add_caveat(Caveat::apps([42]));
//!
//! let header = Bundle::from_macaroons(location, vec![mac]).to_header()?;
//! let bundle = Bundle::parse(location, &header)?;
//!
//! let caveats = bundle.reduce(Vec::new(), |mut all, m| {
//!     all.extend(m.unsafe_caveats().iter().cloned());
//!     all
//! });
//! let scope = app_scope(&CaveatSet::new(caveats));
//! assert_eq!(scope.into_iter().collect::<Vec<_>>(), vec![42]);
//! # Ok::<(), fly_macaroon::MacaroonError>(())
//! ```

mod bundle;
mod caveat;
mod error;
mod macaroon;

pub use bundle::{Bundle, SCHEME};
pub use caveat::{app_scope, Caveat, CaveatSet, CAV_APPS};
pub use error::{MacaroonError, Result};
pub use macaroon::{Macaroon, Nonce, TOKEN_PREFIX};

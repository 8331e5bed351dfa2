// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Platform environment of a Fly.io machine.
//!
//! Every machine is started with a fixed set of `FLY_*` variables describing
//! the app, the machine and where it runs. [`MachineEnv`] captures them once
//! so components receive an explicit value instead of reading the process
//! environment ad hoc.
//!
//! # Example
//!
//! ```
//! use fly_common_env::MachineEnv;
//!
//! let env = MachineEnv::from_lookup(|name| match name {
//!     "FLY_APP_NAME" => Some("billing".to_string()),
//!     "FLY_REGION" => Some("syd".to_string()),
//!     _ => None,
//! });
//!
//! assert_eq!(env.app_name.as_deref(), Some("billing"));
//! assert_eq!(env.region.as_deref(), Some("syd"));
//! assert!(!env.is_fly_machine());
//! ```

use std::sync::OnceLock;

#[cfg(feature = "serde")]
use serde::Serialize;

pub const APP_NAME: &str = "FLY_APP_NAME";
pub const MACHINE_ID: &str = "FLY_MACHINE_ID";
pub const ALLOC_ID: &str = "FLY_ALLOC_ID";
pub const REGION: &str = "FLY_REGION";
pub const PUBLIC_IP: &str = "FLY_PUBLIC_IP";
pub const IMAGE_REF: &str = "FLY_IMAGE_REF";
pub const MACHINE_VERSION: &str = "FLY_MACHINE_VERSION";
pub const PRIVATE_IP: &str = "FLY_PRIVATE_IP";
pub const PROCESS_GROUP: &str = "FLY_PROCESS_GROUP";
pub const VM_MEMORY_MB: &str = "FLY_VM_MEMORY_MB";
pub const PRIMARY_REGION: &str = "FLY_PRIMARY_REGION";

static CURRENT: OnceLock<MachineEnv> = OnceLock::new();

/// Snapshot of the `FLY_*` variables. Unset and empty variables are `None`.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineEnv {
	/// Unique app name. Also the 6PN DNS name, e.g. `syd.$FLY_APP_NAME.internal`.
	pub app_name: Option<String>,
	/// Machine ID, as used by flyctl and the Machines API.
	pub machine_id: Option<String>,
	/// Allocation ID; same value as the machine ID.
	pub alloc_id: Option<String>,
	/// Three-letter region the machine runs in, e.g. `ams`.
	///
	/// Not the `Fly-Region` HTTP header, which names where a connection was
	/// accepted.
	pub region: Option<String>,
	/// Public outbound IPv6 address.
	pub public_ip: Option<String>,
	/// Docker image reference the machine was created from.
	pub image_ref: Option<String>,
	/// Machine configuration version. Metadata updates do not bump it.
	pub machine_version: Option<String>,
	/// IPv6 address on the 6PN private network.
	pub private_ip: Option<String>,
	/// Process group, if the app defines any.
	pub process_group: Option<String>,
	/// Memory allocated to the machine, in MB, as the raw string.
	pub vm_memory_mb: Option<String>,
	/// Primary region from `fly.toml` or `--region`.
	pub primary_region: Option<String>,
}

impl MachineEnv {
	/// Snapshot the process environment.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Snapshot through an arbitrary lookup function.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

		Self {
			app_name: get(APP_NAME),
			machine_id: get(MACHINE_ID),
			alloc_id: get(ALLOC_ID),
			region: get(REGION),
			public_ip: get(PUBLIC_IP),
			image_ref: get(IMAGE_REF),
			machine_version: get(MACHINE_VERSION),
			private_ip: get(PRIVATE_IP),
			process_group: get(PROCESS_GROUP),
			vm_memory_mb: get(VM_MEMORY_MB),
			primary_region: get(PRIMARY_REGION),
		}
	}

	/// Process-wide snapshot, read from the environment on first use.
	pub fn current() -> &'static MachineEnv {
		CURRENT.get_or_init(|| {
			let env = Self::from_env();
			tracing::debug!(
				app_name = ?env.app_name,
				machine_id = ?env.machine_id,
				region = ?env.region,
				"captured machine environment"
			);
			env
		})
	}

	/// Machine memory in MB, if set and numeric.
	pub fn vm_memory_mb(&self) -> Option<u64> {
		self.vm_memory_mb.as_deref()?.trim().parse().ok()
	}

	/// Whether this process looks like it runs on a Fly.io machine.
	pub fn is_fly_machine(&self) -> bool {
		self.machine_id.is_some()
	}
}

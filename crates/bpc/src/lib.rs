//! # bpc - blueprint compiler
//!
//! ## Introduction for developers
//!
//! Read this to understand how `bpc` works internally.
//!
//! ### Blueprints
//!
//! A blueprint ([blueprint::Blueprint]) describes a deployment as an ordered list of *deployment groups*. Each group
//! is a list of *modules*: terraform modules or packer templates, identified by an `id` that is unique across the
//! whole blueprint. Groups are deployed one after another, modules of one group together.
//!
//! ```yaml
//! blueprint_name: example
//! vars:
//!   region: us-east1
//! deployment_groups:
//! - group: primary
//!   modules:
//!   - id: network
//!     source: ./modules/network
//!     settings:
//!       region: ((var.region))        # global variable
//! - group: cluster
//!   modules:
//!   - id: compute
//!     source: ./modules/compute
//!     use: [network]                  # wire outputs of `network` into matching inputs
//!     settings:
//!       subnet: ((network.subnet))    # output of a module in an earlier group
//! ```
//!
//! ### Literal variables
//!
//! Settings refer to other values with `((context.name))` ([literal]):
//! - `((var.name))` is replaced with the global variable `name` ([globals])
//! - `((module_id.output))` refers to an output of another module ([references])
//!
//! Anything else is a plain string.
//!
//! ### Expansion
//!
//! see [blueprint::Blueprint::expand]
//!
//! Module descriptors (declared inputs and outputs, [reader]) are read and used to wire inputs and validate settings.
//! Global variables are then substituted and module references classified:
//!
//! - the referenced module is in the same group: the setting stays *pure* and the reference is written as
//!   `module.<id>.<output>`
//! - the referenced module is in an earlier group: the setting is *impure* ([partition]). The earlier group exports
//!   the output, the consuming group imports it as a variable named by [references::automatic_output_name]
//! - the referenced module is in a later group: expansion fails
//!
//! Settings are converted from YAML into [value::Value] on the way. During traversal of nested values we use the
//! visitor pattern ([Visit](visit::Visit), [VisitMut](visit::VisitMut)).
//!
//! ### Writing
//!
//! An [expand::ExpandedBlueprint] is written group by group ([writer]): terraform groups become a root module with
//! `variables.tf` for imports and `outputs.tf` for exports, packer templates get their pure settings as
//! `defaults.auto.pkrvars.hcl`.
//!
//! ### Validation
//!
//! Unknown settings, missing required inputs and failing validators ([config::Validator]) are reported according to
//! the [overrides::ValidationLevel]. Structural problems (duplicate names, dangling or backward references, unknown
//! global variables) always fail.
pub mod blueprint;
pub mod config;
pub mod error;
pub mod expand;
pub mod globals;
pub mod index;
pub mod literal;
pub mod overrides;
pub mod partition;
pub mod reader;
pub mod references;
mod util;
pub mod value;
pub mod visit;
mod wiring;
pub mod writer;

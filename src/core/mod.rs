// ─── packsync Core ───
// Manifest-driven synchronization of a game folder.
//
// Architecture:
//   core/
//     connectors/: file, HTTP and SFTP storage behind one interface
//     rules/     : platform/arch/feature predicates
//     pack/      : manifest model, game folder, build and publish
//     generator/ : produce a pack from upstream metadata
//     version/   : version list, version JSON, runtimes, Fabric profiles
//     assets/    : asset index and objects
//     maven/     : coordinate parsing
//     auth/, java/, launch/: launcher-facing collaborators

pub mod assets;
pub mod auth;
pub mod checksum;
pub mod config;
pub mod connectors;
pub mod error;
pub mod generator;
pub mod http;
pub mod java;
pub mod launch;
pub mod maven;
pub mod pack;
pub mod progress;
pub mod rules;
pub mod version;

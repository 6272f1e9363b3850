// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Bank editing core for an eight-channel hardware sampler.
//!
//! Each channel's configuration travels inside its own sample file as an
//! embedded RIFF chunk, so a bank on disk is just a directory of wav files
//! plus a name file. This crate models that configuration ([`model`]),
//! reads and writes the embedded record ([`record`] and [`chunk`]), loads
//! and saves whole bank directories ([`bank`]), shares decoded audio
//! between windows ([`cache`]) and answers "has anything changed"
//! ([`compare`]).

pub mod bank;
pub mod cache;
pub mod chunk;
pub mod compare;
pub mod model;
pub mod record;

#[cfg(test)]
mod testutil;

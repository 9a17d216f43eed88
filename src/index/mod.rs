// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Index-support algorithms: extraction and `consistent`/`compress`/`union`/
//! `penalty`/`pick_split`/`same` callbacks for two index method families
//! (`SPEC_FULL.md` §4.8, §4.9).

pub mod signature;
pub mod token;

//! Demo modules. Each file registers itself with `pharos::module!`; the
//! `modules` list in `pharos.toml` picks which ones load.

mod echo;
mod guild;
mod lifecycle;
mod msglog;
mod proactive;
mod robot;

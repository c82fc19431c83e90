//! HTTP routes, one file per domain area.

pub mod contagens;
pub mod produtos;
pub mod relatorio;
pub mod system;

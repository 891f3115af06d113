pub mod common;
pub mod deposit;
pub mod initialize;
pub mod meta;
pub mod rewards;
pub mod transfer;
pub mod view;
pub mod withdraw;

#[allow(ambiguous_glob_reexports)]
pub use deposit::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize::*;
#[allow(ambiguous_glob_reexports)]
pub use meta::*;
#[allow(ambiguous_glob_reexports)]
pub use rewards::*;
#[allow(ambiguous_glob_reexports)]
pub use transfer::*;
#[allow(ambiguous_glob_reexports)]
pub use view::*;
#[allow(ambiguous_glob_reexports)]
pub use withdraw::*;

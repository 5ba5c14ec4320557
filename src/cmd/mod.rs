//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled                                  |
//! |------------|---------------------------------------------------|
//! | `board`    | `Init`, `Status`, `Reset`                         |
//! | `task`     | `Add`, `List`, `Show`, `Move`, `Done`, `Update`, `Delete` |
//! | `archive`  | `Archive`, `Restore`, `SearchArchive`, `Purge`    |
//! | `link`     | `Link`, `Unlink`, `Links`, `Blockers`             |
//! | `next`     | `Next`                                            |
//! | `sync`     | `Sync`                                            |

pub mod archive;
pub mod board;
pub mod link;
pub mod next;
pub mod sync;
pub mod task;

pub use archive::{cmd_archive, cmd_purge, cmd_restore, cmd_search_archive};
pub use board::{cmd_init, cmd_reset, cmd_status};
pub use link::{cmd_blockers, cmd_link, cmd_links, cmd_unlink};
pub use next::cmd_next;
pub use sync::cmd_sync;
pub use task::{cmd_add, cmd_delete, cmd_done, cmd_list, cmd_move, cmd_show, cmd_update};

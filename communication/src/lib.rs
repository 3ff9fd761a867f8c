//! Channel plumbing for ripple graph-processing workers.
//!
//! This crate is part of the ripple graph-processing system, used primarily for the
//! communication between workers and their coordinator. It may be independently useful,
//! but it is separated out mostly to make clear boundaries in the project.
//!
//! Endpoints come in connected pairs: a cloneable [`Mailbox`] for the many producers and
//! a single-consumer [`Inbox`] whose `poll` method blocks with a timeout, which is how an
//! otherwise-quiet worker waits for new work. A [`Directory`] binds the mailboxes of a
//! group of workers and their coordinator together before any of them starts, and
//! [`initialize_from`] spawns one thread per worker and hands back joinable
//! [`WorkerGuards`].
//!
//! # Examples
//! ```
//! use std::time::Duration;
//!
//! let (mailbox, inbox) = ripple_communication::mailbox();
//!
//! mailbox.send(format!("hello, {}", 0));
//! assert_eq!(inbox.recv(), Some("hello, 0".to_owned()));
//!
//! // nothing else is coming; a timed poll reports that.
//! assert_eq!(inbox.poll(Duration::from_millis(1)), None);
//! ```

#![forbid(missing_docs)]

pub mod inbox;
pub mod initialize;
pub mod registry;

pub use inbox::{mailbox, Inbox, Mailbox};
pub use initialize::{initialize_from, WorkerGuards};
pub use registry::Directory;

/// A composite trait for types that may move along channels.
pub trait Data: Send + 'static {}
impl<T: Send + 'static> Data for T {}

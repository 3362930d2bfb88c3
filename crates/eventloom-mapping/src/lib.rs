//! Eventloom Mapping — the bidirectional mapping between typed handler
//! calls and generic event records.
//!
//! Each aggregate type registers its event kinds and encode/decode
//! functions into a [`table::DispatchTable`] built once at startup; call
//! sites use ordinary typed values implementing the shared
//! [`table::EventCall`] capability. The table is consulted by both the
//! write path ([`bus::DispatchingEventBus`]) and the read path
//! ([`source::DispatchingEventSource`]).

pub mod bus;
pub mod kind;
pub mod source;
pub mod table;

//! Wire protocol and RPC transport shared by `bin/broker`, `bin/worker`, and
//! `bin/client`.

mod broker_proto;
mod events;
mod rpc;
mod worker_proto;

pub use broker_proto::{BrokerRequest, BrokerResponse};
pub use events::{Event, SessionState};
pub use rpc::{serve_connection, RpcClient, RpcError};
pub use worker_proto::{WorkerRequest, WorkerResponse};

//! UseCase layer: room join/leave, operation application, mutation broadcast
//! and room creation.

pub mod apply_operation;
pub mod broadcast_mutation;
pub mod create_room;
pub mod error;
pub mod join_room;
pub mod leave_room;

pub use apply_operation::{ApplyOperationUseCase, OperationContext};
pub use broadcast_mutation::{BroadcastBinding, MutationBroadcaster, MutationEncoder};
pub use create_room::CreateRoomUseCase;
pub use error::{ApplyOperationError, CreateRoomError, JoinRoomError};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;

//! Real-time room synchronization server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin rpsync-server
//! cargo run --bin rpsync-server -- --host 0.0.0.0 --port 3000 --room room-42
//! ```

use std::sync::Arc;

use clap::Parser;
use rpsync_server::{
    domain::RoomStore,
    infrastructure::{
        message_pusher::WebSocketMessagePusher, origin::OriginIdFactory,
        repository::InMemoryRoomStore,
    },
    ui::{Server, default_broadcast_bindings},
    usecase::{
        ApplyOperationUseCase, CreateRoomUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        MutationBroadcaster,
    },
};
use rpsync_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "rpsync-server")]
#[command(about = "Real-time room synchronization server for roleplay rooms", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Access code of a room to create at startup (repeatable)
    #[arg(long = "room", value_name = "CODE")]
    rooms: Vec<String>,

    /// Use the first X-Forwarded-For entry as the client address
    #[arg(long)]
    trust_proxy: bool,

    /// Salt for anonymized origin ids (random when omitted)
    #[arg(long)]
    origin_salt: Option<String>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    // Initialize dependencies in order:
    // 1. Room Store
    // 2. MessagePusher
    // 3. UseCases
    // 4. Mutation Broadcaster
    // 5. Server

    // 1. Create Room Store (in-memory database)
    let store = Arc::new(InMemoryRoomStore::new(Arc::new(SystemClock)));

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher = Arc::new(WebSocketMessagePusher::new());

    // 3. Create UseCases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        store.clone(),
        message_pusher.clone(),
    ));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(message_pusher.clone()));
    let apply_operation_usecase = Arc::new(ApplyOperationUseCase::new(store.clone()));
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(store.clone()));

    for code in args.rooms {
        if let Err(e) = create_room_usecase
            .execute("Roleplay room".to_string(), Some(code.clone()))
            .await
        {
            tracing::error!("Failed to create room '{}': {}", code, e);
            std::process::exit(1);
        }
    }

    // 4. Subscribe the broadcaster before any connection is accepted
    MutationBroadcaster::new(message_pusher.clone(), default_broadcast_bindings())
        .spawn(store.subscribe());

    // 5. Create and run the server
    let origin_salt = args
        .origin_salt
        .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let server = Server::new(
        join_room_usecase,
        leave_room_usecase,
        apply_operation_usecase,
        create_room_usecase,
        OriginIdFactory::new(origin_salt, args.trust_proxy),
        message_pusher,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

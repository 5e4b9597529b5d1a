//! InMemory Room Store 実装
//!
//! ドメイン層が定義する `RoomResolver` / `RoomStore` trait の具体的な実装。
//! HashMap をインメモリ DB として使用し、変更が適用されるたびに
//! `tokio::sync::broadcast` で `MutationNotification` を送出します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use rpsync_shared::time::Clock;
use tokio::sync::{Mutex, broadcast};

use crate::domain::{
    AccessCode, Chara, CharaDraft, ConnectionId, IdFactory, ImageUrl, Message, MessageDraft,
    MessageEdit, Mutation, MutationNotification, OriginId, RepositoryError, ResolvedRoom, Room,
    RoomId, RoomResolver, RoomStore, RoomTitle, Timestamp,
};

/// Capacity of the notification channel. Subscribers that fall behind skip
/// notifications (`RecvError::Lagged`).
const NOTIFICATION_CAPACITY: usize = 1024;

#[derive(Default)]
struct Registry {
    rooms: HashMap<RoomId, Room>,
    codes: HashMap<AccessCode, RoomId>,
}

/// インメモリ Room Store 実装
pub struct InMemoryRoomStore {
    registry: Mutex<Registry>,
    events: broadcast::Sender<MutationNotification>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomStore {
    /// 新しい InMemoryRoomStore を作成
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            registry: Mutex::new(Registry::default()),
            events,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// Apply `change` to the room and notify subscribers when it succeeds.
    async fn mutate<T, F>(
        &self,
        room_id: &RoomId,
        origin: &ConnectionId,
        change: F,
        to_mutation: fn(&T) -> Mutation,
    ) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Room) -> Result<T, RepositoryError>,
    {
        let mut registry = self.registry.lock().await;
        let room = registry
            .rooms
            .get_mut(room_id)
            .ok_or(RepositoryError::RoomNotFound)?;
        let applied = change(room)?;
        let revision = room.record_change();

        let notification = MutationNotification {
            room_id: room_id.clone(),
            origin: origin.clone(),
            revision,
            mutation: to_mutation(&applied),
        };
        // send() only fails when nobody subscribes
        if self.events.send(notification).is_err() {
            tracing::debug!("No subscriber for mutation in room '{}'", room_id);
        }

        Ok(applied)
    }
}

#[async_trait]
impl RoomResolver for InMemoryRoomStore {
    async fn resolve(&self, access_code: &AccessCode) -> Result<ResolvedRoom, RepositoryError> {
        let registry = self.registry.lock().await;
        let room = registry
            .codes
            .get(access_code)
            .and_then(|room_id| registry.rooms.get(room_id))
            .ok_or(RepositoryError::RoomNotFound)?;

        Ok(ResolvedRoom {
            room_id: room.id.clone(),
            snapshot: room.snapshot(),
        })
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn create_room(
        &self,
        title: RoomTitle,
        access_code: Option<AccessCode>,
    ) -> Result<AccessCode, RepositoryError> {
        let mut registry = self.registry.lock().await;

        let access_code = match access_code {
            Some(code) if registry.codes.contains_key(&code) => {
                return Err(RepositoryError::AccessCodeTaken(code.as_str().to_string()));
            }
            Some(code) => code,
            None => loop {
                let code = AccessCode::generate();
                if !registry.codes.contains_key(&code) {
                    break code;
                }
            },
        };

        let room = Room::new(IdFactory::room_id(), access_code.clone(), title);
        tracing::info!("Room '{}' created with code '{}'", room.id, access_code);
        registry.codes.insert(access_code.clone(), room.id.clone());
        registry.rooms.insert(room.id.clone(), room);

        Ok(access_code)
    }

    async fn add_message(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        draft: MessageDraft,
        origin_id: &OriginId,
    ) -> Result<Message, RepositoryError> {
        let now = self.now();
        let origin_id = origin_id.clone();
        self.mutate(
            room_id,
            connection_id,
            |room| room.add_message(draft, origin_id, now),
            |message: &Message| Mutation::MessageAdded(message.clone()),
        )
        .await
    }

    async fn edit_message(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        edit: MessageEdit,
        origin_id: &OriginId,
    ) -> Result<Message, RepositoryError> {
        let now = self.now();
        self.mutate(
            room_id,
            connection_id,
            |room| room.edit_message(edit, origin_id, now),
            |message: &Message| Mutation::MessageEdited(message.clone()),
        )
        .await
    }

    async fn add_image(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        url: ImageUrl,
        origin_id: &OriginId,
    ) -> Result<Message, RepositoryError> {
        let now = self.now();
        let origin_id = origin_id.clone();
        self.mutate(
            room_id,
            connection_id,
            |room| Ok(room.add_image(url, origin_id, now)),
            |message: &Message| Mutation::MessageAdded(message.clone()),
        )
        .await
    }

    async fn add_chara(
        &self,
        room_id: &RoomId,
        connection_id: &ConnectionId,
        draft: CharaDraft,
        _origin_id: &OriginId,
    ) -> Result<Chara, RepositoryError> {
        self.mutate(
            room_id,
            connection_id,
            |room| Ok(room.add_chara(draft)),
            |chara: &Chara| Mutation::CharaAdded(chara.clone()),
        )
        .await
    }

    fn subscribe(&self) -> broadcast::Receiver<MutationNotification> {
        self.events.subscribe()
    }
}

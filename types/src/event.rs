use crate::AccountId;

/// What a chat-timeline entry describes.
#[derive(Clone, Debug, PartialEq)]
pub enum ChatContent {
    /// Plain user text.
    Text(String),
    /// A gift was sent. `recipient_name` is the display name of the target,
    /// or "everyone" for a room broadcast.
    GiftSent {
        gift_id: String,
        gift_name: String,
        quantity: u32,
        recipient_name: String,
    },
    /// A lucky gift refunded coins to the sender.
    LuckyWin {
        gift_id: String,
        gift_name: String,
        amount: u64,
    },
    /// A system line (agency recharges, room administration).
    System(String),
}

/// One chat-timeline event rendered by the presentation collaborator.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatEvent {
    pub sender: AccountId,
    pub sender_name: String,
    pub content: ChatContent,
}

/// Why a room-wide announcement fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnouncementKind {
    /// A gift at or above the broadcast threshold.
    Gift,
    /// A lucky win, announced regardless of size.
    LuckyWin,
}

/// A global banner shown in every room.
#[derive(Clone, Debug, PartialEq)]
pub struct Announcement {
    pub sender_name: String,
    pub recipient_name: String,
    pub gift_name: String,
    pub gift_icon: String,
    pub room_id: String,
    pub room_title: String,
    pub kind: AnnouncementKind,
    pub amount: u64,
}

/// Everything the engine pushes to the presentation collaborator.
#[derive(Clone, Debug, PartialEq)]
pub enum RoomEvent {
    Chat(ChatEvent),
    Announcement(Announcement),
    /// Time-limited celebratory strip for the winning sender.
    LuckyWin { account: AccountId, amount: u64 },
    /// The active combo streak ran out its countdown.
    ComboExpired,
    /// An agent recharged a user from the agency pool.
    AgencyRecharge {
        agent: AccountId,
        target: AccountId,
        amount: u64,
    },
    /// A remote write could not be persisted; the local optimistic state is
    /// kept (see the sync policy notes on the dispatcher).
    SyncFailed { account: AccountId },
}

use std::fmt;

pub const INPUT_BODY_LEN: usize = 2;
pub const SPECTATE_BODY_LEN: usize = 1;
pub const DROP_ITEM_BODY_LEN: usize = 3;
pub const EMOTE_BODY_LEN: usize = 11;

const INPUT_MOVE_LEFT: u8 = 1 << 0;
const INPUT_MOVE_RIGHT: u8 = 1 << 1;
const INPUT_MOVE_UP: u8 = 1 << 2;
const INPUT_MOVE_DOWN: u8 = 1 << 3;
const INPUT_SHOOT_START: u8 = 1 << 4;
const INPUT_SHOOT_HOLD: u8 = 1 << 5;

const SPECTATE_BEGIN: u8 = 1 << 0;
const SPECTATE_NEXT: u8 = 1 << 1;
const SPECTATE_PREV: u8 = 1 << 2;
const SPECTATE_FORCE: u8 = 1 << 3;

/// Leading type tag of every client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    Input = 3,
    Spectate = 11,
    DropItem = 12,
    Emote = 13,
}

impl MsgType {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            3 => Some(Self::Input),
            11 => Some(Self::Spectate),
            12 => Some(Self::DropItem),
            13 => Some(Self::Emote),
            _ => None,
        }
    }
}

impl fmt::Display for MsgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Input => "input",
            Self::Spectate => "spectate",
            Self::DropItem => "drop_item",
            Self::Emote => "emote",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    EmptyFrame,
    UnknownType { tag: u8 },
    Truncated { msg: MsgType, expected: usize, actual: usize },
    BadField { msg: MsgType, field: &'static str, value: u8 },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFrame => write!(f, "empty frame: no message type tag"),
            Self::UnknownType { tag } => write!(f, "unknown message type tag: {tag}"),
            Self::Truncated { msg, expected, actual } => {
                write!(f, "truncated {msg} body: expected {expected} bytes, got {actual}")
            }
            Self::BadField { msg, field, value } => {
                write!(f, "invalid {field} in {msg} body: {value}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Player input state, sampled every client tick while a key is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputMsg {
    pub seq: u8,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub shoot_start: bool,
    pub shoot_hold: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectateMsg {
    pub spec_begin: bool,
    pub spec_next: bool,
    pub spec_prev: bool,
    pub spec_force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropItemMsg {
    pub item: u16,
    pub weap_idx: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmoteMsg {
    pub x: f32,
    pub y: f32,
    pub emote: u16,
    pub is_ping: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClientMessage {
    Input(InputMsg),
    Spectate(SpectateMsg),
    DropItem(DropItemMsg),
    Emote(EmoteMsg),
}

impl ClientMessage {
    pub fn msg_type(&self) -> MsgType {
        match self {
            Self::Input(_) => MsgType::Input,
            Self::Spectate(_) => MsgType::Spectate,
            Self::DropItem(_) => MsgType::DropItem,
            Self::Emote(_) => MsgType::Emote,
        }
    }

    pub fn control_intent(&self) -> Option<ControlIntent> {
        match self {
            Self::Input(input) => Some(input.control_intent()),
            _ => None,
        }
    }
}

/// Playback controls recovered from one input message.
///
/// The operator drives playback with ordinary game keybinds: move up holds
/// fast-forward, move right requests a single frame, starting to shoot
/// toggles pause. Held keys are reasserted by every input message, so
/// `accelerate` and `step` reflect the latest message alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlIntent {
    pub accelerate: bool,
    pub step: bool,
    pub toggle_pause: bool,
}

impl InputMsg {
    pub fn control_intent(&self) -> ControlIntent {
        ControlIntent {
            accelerate: self.move_up,
            step: self.move_right,
            toggle_pause: self.shoot_start,
        }
    }
}

fn body_prefix(msg: MsgType, body: &[u8], expected: usize) -> Result<&[u8], ProtocolError> {
    if body.len() < expected {
        return Err(ProtocolError::Truncated {
            msg,
            expected,
            actual: body.len(),
        });
    }
    Ok(&body[..expected])
}

// Bodies longer than the fixed layout are accepted; clients pad frames.
pub fn decode_client_message(frame: &[u8]) -> Result<ClientMessage, ProtocolError> {
    let (&tag, body) = frame.split_first().ok_or(ProtocolError::EmptyFrame)?;
    let msg = MsgType::from_tag(tag).ok_or(ProtocolError::UnknownType { tag })?;
    match msg {
        MsgType::Input => decode_input(body).map(ClientMessage::Input),
        MsgType::Spectate => decode_spectate(body).map(ClientMessage::Spectate),
        MsgType::DropItem => decode_drop_item(body).map(ClientMessage::DropItem),
        MsgType::Emote => decode_emote(body).map(ClientMessage::Emote),
    }
}

fn decode_input(body: &[u8]) -> Result<InputMsg, ProtocolError> {
    let body = body_prefix(MsgType::Input, body, INPUT_BODY_LEN)?;
    let flags = body[1];
    Ok(InputMsg {
        seq: body[0],
        move_left: flags & INPUT_MOVE_LEFT != 0,
        move_right: flags & INPUT_MOVE_RIGHT != 0,
        move_up: flags & INPUT_MOVE_UP != 0,
        move_down: flags & INPUT_MOVE_DOWN != 0,
        shoot_start: flags & INPUT_SHOOT_START != 0,
        shoot_hold: flags & INPUT_SHOOT_HOLD != 0,
    })
}

fn decode_spectate(body: &[u8]) -> Result<SpectateMsg, ProtocolError> {
    let body = body_prefix(MsgType::Spectate, body, SPECTATE_BODY_LEN)?;
    let flags = body[0];
    Ok(SpectateMsg {
        spec_begin: flags & SPECTATE_BEGIN != 0,
        spec_next: flags & SPECTATE_NEXT != 0,
        spec_prev: flags & SPECTATE_PREV != 0,
        spec_force: flags & SPECTATE_FORCE != 0,
    })
}

fn decode_drop_item(body: &[u8]) -> Result<DropItemMsg, ProtocolError> {
    let body = body_prefix(MsgType::DropItem, body, DROP_ITEM_BODY_LEN)?;
    Ok(DropItemMsg {
        item: u16::from_le_bytes([body[0], body[1]]),
        weap_idx: body[2],
    })
}

fn decode_emote(body: &[u8]) -> Result<EmoteMsg, ProtocolError> {
    let body = body_prefix(MsgType::Emote, body, EMOTE_BODY_LEN)?;
    let is_ping = match body[10] {
        0 => false,
        1 => true,
        value => {
            return Err(ProtocolError::BadField {
                msg: MsgType::Emote,
                field: "is_ping",
                value,
            });
        }
    };
    Ok(EmoteMsg {
        x: f32::from_le_bytes([body[0], body[1], body[2], body[3]]),
        y: f32::from_le_bytes([body[4], body[5], body[6], body[7]]),
        emote: u16::from_le_bytes([body[8], body[9]]),
        is_ping,
    })
}

pub fn encode_client_message(message: &ClientMessage) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(message.msg_type() as u8);
    match message {
        ClientMessage::Input(input) => {
            out.push(input.seq);
            out.push(input_flags(input));
        }
        ClientMessage::Spectate(spectate) => {
            out.push(spectate_flags(spectate));
        }
        ClientMessage::DropItem(drop) => {
            out.extend_from_slice(&drop.item.to_le_bytes());
            out.push(drop.weap_idx);
        }
        ClientMessage::Emote(emote) => {
            out.extend_from_slice(&emote.x.to_le_bytes());
            out.extend_from_slice(&emote.y.to_le_bytes());
            out.extend_from_slice(&emote.emote.to_le_bytes());
            out.push(emote.is_ping as u8);
        }
    }
    out
}

fn input_flags(input: &InputMsg) -> u8 {
    let mut flags = 0;
    if input.move_left {
        flags |= INPUT_MOVE_LEFT;
    }
    if input.move_right {
        flags |= INPUT_MOVE_RIGHT;
    }
    if input.move_up {
        flags |= INPUT_MOVE_UP;
    }
    if input.move_down {
        flags |= INPUT_MOVE_DOWN;
    }
    if input.shoot_start {
        flags |= INPUT_SHOOT_START;
    }
    if input.shoot_hold {
        flags |= INPUT_SHOOT_HOLD;
    }
    flags
}

fn spectate_flags(spectate: &SpectateMsg) -> u8 {
    let mut flags = 0;
    if spectate.spec_begin {
        flags |= SPECTATE_BEGIN;
    }
    if spectate.spec_next {
        flags |= SPECTATE_NEXT;
    }
    if spectate.spec_prev {
        flags |= SPECTATE_PREV;
    }
    if spectate.spec_force {
        flags |= SPECTATE_FORCE;
    }
    flags
}

//! Wire protocol records.
//!
//! Every packet starts with a little-endian `i32` type tag. Records are
//! packed with natural field order and no padding; the update packet carries
//! a variable `NetObject` trailer truncated to `object_count` entries, and
//! the message packet a `text[length]` trailer.

pub mod codec;

use crate::config::{MAX_NET_BEAMS, MAX_NET_OBJECTS};

pub use codec::{ByteReader, ByteWriter, WireError, NAME_LEN};

pub const PKT_LOGIN: i32 = 1;
pub const PKT_COMMAND: i32 = 2;
pub const PKT_UPDATE: i32 = 3;
pub const PKT_MESSAGE: i32 = 4;
pub const PKT_QUERY: i32 = 5;
pub const PKT_HANDSHAKE: i32 = 6;

pub const SCOPE_GLOBAL: i32 = 0;
pub const SCOPE_FACTION: i32 = 1;
pub const SCOPE_PRIVATE: i32 = 2;

pub const CMD_LEN: usize = 256;
pub const HANDSHAKE_PUBKEY_LEN: usize = 256;
pub const MAX_TEXT_LEN: usize = 65535;

/// Total encoded sizes of the fixed-layout inbound packets.
pub const LOGIN_FRAME_LEN: usize = 4 + NAME_LEN + 4 + 4;
pub const COMMAND_FRAME_LEN: usize = 4 + CMD_LEN;
pub const HANDSHAKE_FRAME_LEN: usize = 4 + 4 + HANDSHAKE_PUBKEY_LEN;
/// Message header up to (and excluding) the text trailer.
pub const MESSAGE_HEADER_LEN: usize = 4 + NAME_LEN + 4 + 4 + 4 + 4 + 8 + 1 + 1 + 12 + 16 + 1 + 64 + 32;
/// Byte offset of the `length` field inside a message frame.
const MESSAGE_LENGTH_OFFSET: usize = 4 + NAME_LEN + 4 + 4 + 4;

/// Update header up to (and excluding) the object trailer.
pub const UPDATE_HEADER_LEN: usize = 462;
pub const NET_OBJECT_LEN: usize = 104;

/// Login and name-query share one layout; queries only use the name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PacketLogin {
    pub name: String,
    pub faction: i32,
    pub ship_class: i32,
}

impl PacketLogin {
    pub fn encode(&self, tag: i32) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(LOGIN_FRAME_LEN);
        w.put_i32(tag);
        w.put_name(&self.name);
        w.put_i32(self.faction);
        w.put_i32(self.ship_class);
        w.into_bytes()
    }

    pub fn decode(body: &[u8]) -> Result<Self, WireError> {
        let mut r = ByteReader::new(body);
        let _tag = r.get_i32()?;
        Ok(Self {
            name: r.get_name()?,
            faction: r.get_i32()?,
            ship_class: r.get_i32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PacketCommand {
    pub cmd: String,
}

impl PacketCommand {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(COMMAND_FRAME_LEN);
        w.put_i32(PKT_COMMAND);
        let bytes = self.cmd.as_bytes();
        let n = bytes.len().min(CMD_LEN - 1);
        w.put_bytes(&bytes[..n]);
        w.put_bytes(&vec![0u8; CMD_LEN - n]);
        w.into_bytes()
    }

    pub fn decode(body: &[u8]) -> Result<Self, WireError> {
        let mut r = ByteReader::new(body);
        let _tag = r.get_i32()?;
        let raw: [u8; CMD_LEN] = r.get_bytes()?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(CMD_LEN);
        Ok(Self {
            cmd: String::from_utf8_lossy(&raw[..end]).into_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PacketHandshake {
    pub pubkey_len: i32,
    pub pubkey: [u8; HANDSHAKE_PUBKEY_LEN],
}

impl Default for PacketHandshake {
    fn default() -> Self {
        Self {
            pubkey_len: 0,
            pubkey: [0; HANDSHAKE_PUBKEY_LEN],
        }
    }
}

impl PacketHandshake {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(HANDSHAKE_FRAME_LEN);
        w.put_i32(PKT_HANDSHAKE);
        w.put_i32(self.pubkey_len);
        w.put_bytes(&self.pubkey);
        w.into_bytes()
    }

    pub fn decode(body: &[u8]) -> Result<Self, WireError> {
        let mut r = ByteReader::new(body);
        let _tag = r.get_i32()?;
        Ok(Self {
            pubkey_len: r.get_i32()?,
            pubkey: r.get_bytes()?,
        })
    }
}

/// Chat / server notice. `text` carries plaintext or ciphertext depending on
/// `is_encrypted`; its length rides in the fixed header.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketMessage {
    pub from: String,
    pub faction: i32,
    pub scope: i32,
    pub target_id: i32,
    pub origin_frame: i64,
    pub is_encrypted: u8,
    pub crypto_algo: u8,
    pub iv: [u8; 12],
    pub tag: [u8; 16],
    pub has_signature: u8,
    pub signature: [u8; 64],
    pub sender_pubkey: [u8; 32],
    pub text: Vec<u8>,
}

impl Default for PacketMessage {
    fn default() -> Self {
        Self {
            from: String::new(),
            faction: 0,
            scope: SCOPE_GLOBAL,
            target_id: 0,
            origin_frame: 0,
            is_encrypted: 0,
            crypto_algo: 0,
            iv: [0; 12],
            tag: [0; 16],
            has_signature: 0,
            signature: [0; 64],
            sender_pubkey: [0; 32],
            text: Vec::new(),
        }
    }
}

impl PacketMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::with_capacity(MESSAGE_HEADER_LEN + self.text.len());
        w.put_i32(PKT_MESSAGE);
        w.put_name(&self.from);
        w.put_i32(self.faction);
        w.put_i32(self.scope);
        w.put_i32(self.target_id);
        w.put_i32(self.text.len() as i32);
        w.put_i64(self.origin_frame);
        w.put_u8(self.is_encrypted);
        w.put_u8(self.crypto_algo);
        w.put_bytes(&self.iv);
        w.put_bytes(&self.tag);
        w.put_u8(self.has_signature);
        w.put_bytes(&self.signature);
        w.put_bytes(&self.sender_pubkey);
        w.put_bytes(&self.text);
        w.into_bytes()
    }

    pub fn decode(body: &[u8]) -> Result<Self, WireError> {
        let mut r = ByteReader::new(body);
        let _tag = r.get_i32()?;
        let from = r.get_name()?;
        let faction = r.get_i32()?;
        let scope = r.get_i32()?;
        let target_id = r.get_i32()?;
        let length = r.get_i32()?;
        if length < 0 || length as usize > MAX_TEXT_LEN {
            return Err(WireError::BadValue("message length"));
        }
        let origin_frame = r.get_i64()?;
        let is_encrypted = r.get_u8()?;
        let crypto_algo = r.get_u8()?;
        let iv = r.get_bytes()?;
        let tag = r.get_bytes()?;
        let has_signature = r.get_u8()?;
        let signature = r.get_bytes()?;
        let sender_pubkey = r.get_bytes()?;
        let text = r.get_vec(length as usize)?;
        Ok(Self {
            from,
            faction,
            scope,
            target_id,
            origin_frame,
            is_encrypted,
            crypto_algo,
            iv,
            tag,
            has_signature,
            signature,
            sender_pubkey,
            text,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub active: i32,
}

impl NetPoint {
    fn put(&self, w: &mut ByteWriter) {
        w.put_f32(self.x);
        w.put_f32(self.y);
        w.put_f32(self.z);
        w.put_i32(self.active);
    }

    fn get(r: &mut ByteReader) -> Result<Self, WireError> {
        Ok(Self {
            x: r.get_f32()?,
            y: r.get_f32()?,
            z: r.get_f32()?,
            active: r.get_i32()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetBeam {
    pub tx: f32,
    pub ty: f32,
    pub tz: f32,
    pub active: i32,
}

impl NetBeam {
    fn put(&self, w: &mut ByteWriter) {
        w.put_f32(self.tx);
        w.put_f32(self.ty);
        w.put_f32(self.tz);
        w.put_i32(self.active);
    }

    fn get(r: &mut ByteReader) -> Result<Self, WireError> {
        Ok(Self {
            tx: r.get_f32()?,
            ty: r.get_f32()?,
            tz: r.get_f32()?,
            active: r.get_i32()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetDismantle {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub species: i32,
    pub active: i32,
}

impl NetDismantle {
    fn put(&self, w: &mut ByteWriter) {
        w.put_f32(self.x);
        w.put_f32(self.y);
        w.put_f32(self.z);
        w.put_i32(self.species);
        w.put_i32(self.active);
    }

    fn get(r: &mut ByteReader) -> Result<Self, WireError> {
        Ok(Self {
            x: r.get_f32()?,
            y: r.get_f32()?,
            z: r.get_f32()?,
            species: r.get_i32()?,
            active: r.get_i32()?,
        })
    }
}

/// One visible object in the player's quadrant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetObject {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub h: f32,
    pub m: f32,
    /// Object-kind tag, or the faction value for NPC ships.
    pub kind: i32,
    pub ship_class: i32,
    pub active: i32,
    pub health_pct: i32,
    /// Universal target id.
    pub id: i32,
    pub name: String,
}

impl NetObject {
    fn put(&self, w: &mut ByteWriter) {
        w.put_f32(self.x);
        w.put_f32(self.y);
        w.put_f32(self.z);
        w.put_f32(self.h);
        w.put_f32(self.m);
        w.put_i32(self.kind);
        w.put_i32(self.ship_class);
        w.put_i32(self.active);
        w.put_i32(self.health_pct);
        w.put_i32(self.id);
        w.put_name(&self.name);
    }

    fn get(r: &mut ByteReader) -> Result<Self, WireError> {
        Ok(Self {
            x: r.get_f32()?,
            y: r.get_f32()?,
            z: r.get_f32()?,
            h: r.get_f32()?,
            m: r.get_f32()?,
            kind: r.get_i32()?,
            ship_class: r.get_i32()?,
            active: r.get_i32()?,
            health_pct: r.get_i32()?,
            id: r.get_i32()?,
            name: r.get_name()?,
        })
    }
}

/// The per-tick authoritative state snapshot for one client.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketUpdate {
    pub frame_id: i64,
    pub q: [i32; 3],
    pub s: [f32; 3],
    pub ent_h: f32,
    pub ent_m: f32,
    pub energy: i32,
    pub torpedoes: i32,
    pub cargo_energy: i32,
    pub cargo_torpedoes: i32,
    pub crew_count: i32,
    pub shields: [i32; 6],
    pub inventory: [i32; 8],
    pub system_health: [f32; 10],
    pub power_dist: [f32; 3],
    pub life_support: f32,
    pub corbomite_count: i32,
    pub lock_target: i32,
    pub tube_state: i32,
    pub phaser_charge: f32,
    pub is_cloaked: u8,
    pub encryption_enabled: u8,
    pub torp: NetPoint,
    pub boom: NetPoint,
    pub wormhole: NetPoint,
    pub jump_arrival: NetPoint,
    pub dismantle: NetDismantle,
    pub supernova_pos: NetPoint,
    pub supernova_q: [i32; 3],
    pub beam_count: i32,
    pub beams: [NetBeam; MAX_NET_BEAMS],
    pub map_update_val: i64,
    pub map_update_q: [i32; 3],
    pub objects: Vec<NetObject>,
}

impl Default for PacketUpdate {
    fn default() -> Self {
        Self {
            frame_id: 0,
            q: [0; 3],
            s: [0.0; 3],
            ent_h: 0.0,
            ent_m: 0.0,
            energy: 0,
            torpedoes: 0,
            cargo_energy: 0,
            cargo_torpedoes: 0,
            crew_count: 0,
            shields: [0; 6],
            inventory: [0; 8],
            system_health: [0.0; 10],
            power_dist: [0.0; 3],
            life_support: 0.0,
            corbomite_count: 0,
            lock_target: 0,
            tube_state: 0,
            phaser_charge: 0.0,
            is_cloaked: 0,
            encryption_enabled: 0,
            torp: NetPoint::default(),
            boom: NetPoint::default(),
            wormhole: NetPoint::default(),
            jump_arrival: NetPoint::default(),
            dismantle: NetDismantle::default(),
            supernova_pos: NetPoint::default(),
            supernova_q: [0; 3],
            beam_count: 0,
            beams: [NetBeam::default(); MAX_NET_BEAMS],
            map_update_val: 0,
            map_update_q: [0; 3],
            objects: Vec::new(),
        }
    }
}

impl PacketUpdate {
    /// Encode truncated to the live object count.
    pub fn encode(&self) -> Vec<u8> {
        let count = self.objects.len().min(MAX_NET_OBJECTS);
        let mut w = ByteWriter::with_capacity(UPDATE_HEADER_LEN + count * NET_OBJECT_LEN);
        w.put_i32(PKT_UPDATE);
        w.put_i64(self.frame_id);
        for v in self.q {
            w.put_i32(v);
        }
        for v in self.s {
            w.put_f32(v);
        }
        w.put_f32(self.ent_h);
        w.put_f32(self.ent_m);
        w.put_i32(self.energy);
        w.put_i32(self.torpedoes);
        w.put_i32(self.cargo_energy);
        w.put_i32(self.cargo_torpedoes);
        w.put_i32(self.crew_count);
        for v in self.shields {
            w.put_i32(v);
        }
        for v in self.inventory {
            w.put_i32(v);
        }
        for v in self.system_health {
            w.put_f32(v);
        }
        for v in self.power_dist {
            w.put_f32(v);
        }
        w.put_f32(self.life_support);
        w.put_i32(self.corbomite_count);
        w.put_i32(self.lock_target);
        w.put_i32(self.tube_state);
        w.put_f32(self.phaser_charge);
        w.put_u8(self.is_cloaked);
        w.put_u8(self.encryption_enabled);
        self.torp.put(&mut w);
        self.boom.put(&mut w);
        self.wormhole.put(&mut w);
        self.jump_arrival.put(&mut w);
        self.dismantle.put(&mut w);
        self.supernova_pos.put(&mut w);
        for v in self.supernova_q {
            w.put_i32(v);
        }
        w.put_i32(self.beam_count);
        for beam in &self.beams {
            beam.put(&mut w);
        }
        w.put_i64(self.map_update_val);
        for v in self.map_update_q {
            w.put_i32(v);
        }
        w.put_i32(count as i32);
        for object in self.objects.iter().take(count) {
            object.put(&mut w);
        }
        w.into_bytes()
    }

    pub fn decode(body: &[u8]) -> Result<Self, WireError> {
        let mut r = ByteReader::new(body);
        let _tag = r.get_i32()?;
        let mut upd = Self {
            frame_id: r.get_i64()?,
            ..Self::default()
        };
        for v in &mut upd.q {
            *v = r.get_i32()?;
        }
        for v in &mut upd.s {
            *v = r.get_f32()?;
        }
        upd.ent_h = r.get_f32()?;
        upd.ent_m = r.get_f32()?;
        upd.energy = r.get_i32()?;
        upd.torpedoes = r.get_i32()?;
        upd.cargo_energy = r.get_i32()?;
        upd.cargo_torpedoes = r.get_i32()?;
        upd.crew_count = r.get_i32()?;
        for v in &mut upd.shields {
            *v = r.get_i32()?;
        }
        for v in &mut upd.inventory {
            *v = r.get_i32()?;
        }
        for v in &mut upd.system_health {
            *v = r.get_f32()?;
        }
        for v in &mut upd.power_dist {
            *v = r.get_f32()?;
        }
        upd.life_support = r.get_f32()?;
        upd.corbomite_count = r.get_i32()?;
        upd.lock_target = r.get_i32()?;
        upd.tube_state = r.get_i32()?;
        upd.phaser_charge = r.get_f32()?;
        upd.is_cloaked = r.get_u8()?;
        upd.encryption_enabled = r.get_u8()?;
        upd.torp = NetPoint::get(&mut r)?;
        upd.boom = NetPoint::get(&mut r)?;
        upd.wormhole = NetPoint::get(&mut r)?;
        upd.jump_arrival = NetPoint::get(&mut r)?;
        upd.dismantle = NetDismantle::get(&mut r)?;
        upd.supernova_pos = NetPoint::get(&mut r)?;
        for v in &mut upd.supernova_q {
            *v = r.get_i32()?;
        }
        upd.beam_count = r.get_i32()?;
        for beam in &mut upd.beams {
            *beam = NetBeam::get(&mut r)?;
        }
        upd.map_update_val = r.get_i64()?;
        for v in &mut upd.map_update_q {
            *v = r.get_i32()?;
        }
        let object_count = r.get_i32()?;
        if object_count < 0 || object_count as usize > MAX_NET_OBJECTS {
            return Err(WireError::BadValue("object_count"));
        }
        for _ in 0..object_count {
            upd.objects.push(NetObject::get(&mut r)?);
        }
        Ok(upd)
    }
}

/// Number of bytes the complete inbound frame starting in `buf` will occupy,
/// or `None` when more bytes are needed to tell.
pub fn inbound_frame_len(buf: &[u8]) -> Result<Option<usize>, WireError> {
    if buf.len() < 4 {
        return Ok(None);
    }
    let tag = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    match tag {
        PKT_LOGIN | PKT_QUERY => Ok(Some(LOGIN_FRAME_LEN)),
        PKT_COMMAND => Ok(Some(COMMAND_FRAME_LEN)),
        PKT_HANDSHAKE => Ok(Some(HANDSHAKE_FRAME_LEN)),
        PKT_MESSAGE => {
            if buf.len() < MESSAGE_LENGTH_OFFSET + 4 {
                return Ok(None);
            }
            let length = i32::from_le_bytes([
                buf[MESSAGE_LENGTH_OFFSET],
                buf[MESSAGE_LENGTH_OFFSET + 1],
                buf[MESSAGE_LENGTH_OFFSET + 2],
                buf[MESSAGE_LENGTH_OFFSET + 3],
            ]);
            if length < 0 || length as usize > MAX_TEXT_LEN {
                return Err(WireError::BadValue("message length"));
            }
            Ok(Some(MESSAGE_HEADER_LEN + length as usize))
        }
        other => Err(WireError::BadType(other)),
    }
}

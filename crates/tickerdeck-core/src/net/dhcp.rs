//! Tiny DHCP server for clients of the configuration access point.
//!
//! Hands out addresses from a fixed ten-address pool, one per client MAC.
//! Leases are never expired early; when the table is full the oldest lease
//! is reused.

use heapless::Vec;
use log::debug;
use thiserror_no_std::Error;

pub const LEASE_SECS: u32 = 3_600;
pub const POOL_FIRST_HOST: u8 = 2;
pub const POOL_SIZE: usize = 10;

const BOOTP_LEN: usize = 236;
const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];
const OPTIONS_START: usize = BOOTP_LEN + 4;

/// Reply size: fixed part, cookie and the options this server writes.
pub const MAX_REPLY_LEN: usize = 300;

const OP_BOOTREQUEST: u8 = 1;
const OP_BOOTREPLY: u8 = 2;

const OPT_PAD: u8 = 0;
const OPT_SUBNET_MASK: u8 = 1;
const OPT_ROUTER: u8 = 3;
const OPT_DNS: u8 = 6;
const OPT_REQUESTED_IP: u8 = 50;
const OPT_LEASE_TIME: u8 = 51;
const OPT_MESSAGE_TYPE: u8 = 53;
const OPT_SERVER_ID: u8 = 54;
const OPT_END: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl MessageType {
    fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => MessageType::Discover,
            2 => MessageType::Offer,
            3 => MessageType::Request,
            4 => MessageType::Decline,
            5 => MessageType::Ack,
            6 => MessageType::Nak,
            7 => MessageType::Release,
            8 => MessageType::Inform,
            _ => return None,
        })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpError {
    #[error("packet too short")]
    TooShort,
    #[error("not a BOOTP request")]
    NotARequest,
    #[error("missing magic cookie")]
    BadMagic,
    #[error("missing message type")]
    MissingMessageType,
    #[error("reply buffer too small")]
    BufferTooSmall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lease {
    mac: [u8; 6],
    addr: [u8; 4],
}

pub struct DhcpServer {
    server: [u8; 4],
    leases: Vec<Lease, POOL_SIZE>,
}

impl DhcpServer {
    /// `server` is both the router and the DNS server handed to clients.
    pub const fn new(server: [u8; 4]) -> Self {
        Self {
            server,
            leases: Vec::new(),
        }
    }

    pub fn lease_for(&self, mac: &[u8; 6]) -> Option<[u8; 4]> {
        self.leases.iter().find(|l| &l.mac == mac).map(|l| l.addr)
    }

    fn in_pool(&self, addr: [u8; 4]) -> bool {
        addr[..3] == self.server[..3]
            && (POOL_FIRST_HOST..POOL_FIRST_HOST + POOL_SIZE as u8).contains(&addr[3])
    }

    fn holder_of(&self, addr: [u8; 4]) -> Option<[u8; 6]> {
        self.leases.iter().find(|l| l.addr == addr).map(|l| l.mac)
    }

    fn allocate(&mut self, mac: [u8; 6]) -> [u8; 4] {
        if let Some(addr) = self.lease_for(&mac) {
            return addr;
        }
        let free = (0..POOL_SIZE as u8)
            .map(|i| [self.server[0], self.server[1], self.server[2], POOL_FIRST_HOST + i])
            .find(|addr| self.holder_of(*addr).is_none());
        let addr = match free {
            Some(addr) => addr,
            None => self.leases.remove(0).addr,
        };
        let _ = self.leases.push(Lease { mac, addr });
        addr
    }

    /// Process one client packet; returns the reply length if a reply is due.
    pub fn handle(&mut self, packet: &[u8], out: &mut [u8]) -> Result<Option<usize>, DhcpError> {
        if packet.len() < OPTIONS_START {
            return Err(DhcpError::TooShort);
        }
        if packet[0] != OP_BOOTREQUEST {
            return Err(DhcpError::NotARequest);
        }
        if packet[BOOTP_LEN..OPTIONS_START] != MAGIC_COOKIE {
            return Err(DhcpError::BadMagic);
        }
        if out.len() < MAX_REPLY_LEN {
            return Err(DhcpError::BufferTooSmall);
        }

        let mut mac = [0u8; 6];
        mac.copy_from_slice(&packet[28..34]);

        let options = &packet[OPTIONS_START..];
        let kind = find_option(options, OPT_MESSAGE_TYPE)
            .and_then(|v| v.first().copied())
            .and_then(MessageType::from_u8)
            .ok_or(DhcpError::MissingMessageType)?;

        match kind {
            MessageType::Discover => {
                let addr = self.allocate(mac);
                debug!(" DHCP offer {:?} to {:02x?}", addr, mac);
                Ok(Some(self.reply(packet, MessageType::Offer, addr, out)))
            }
            MessageType::Request => {
                let requested = find_option(options, OPT_REQUESTED_IP)
                    .and_then(|v| <[u8; 4]>::try_from(v).ok())
                    .unwrap_or([packet[12], packet[13], packet[14], packet[15]]);

                let taken = self.holder_of(requested).is_some_and(|m| m != mac);
                if !self.in_pool(requested) || taken {
                    debug!(" DHCP nak {:?} for {:02x?}", requested, mac);
                    return Ok(Some(self.reply(packet, MessageType::Nak, [0; 4], out)));
                }

                self.leases.retain(|l| l.mac != mac);
                if self.leases.is_full() {
                    self.leases.remove(0);
                }
                let _ = self.leases.push(Lease {
                    mac,
                    addr: requested,
                });
                debug!(" DHCP ack {:?} to {:02x?}", requested, mac);
                Ok(Some(self.reply(packet, MessageType::Ack, requested, out)))
            }
            MessageType::Release => {
                self.leases.retain(|l| l.mac != mac);
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn reply(&self, request: &[u8], kind: MessageType, yiaddr: [u8; 4], out: &mut [u8]) -> usize {
        out[..MAX_REPLY_LEN].fill(0);
        out[0] = OP_BOOTREPLY;
        out[1] = request[1];
        out[2] = request[2];
        // xid, secs, flags
        out[4..12].copy_from_slice(&request[4..12]);
        out[16..20].copy_from_slice(&yiaddr);
        out[20..24].copy_from_slice(&self.server);
        // giaddr, chaddr
        out[24..44].copy_from_slice(&request[24..44]);
        out[BOOTP_LEN..OPTIONS_START].copy_from_slice(&MAGIC_COOKIE);

        let mut w = OptionWriter {
            buf: out,
            pos: OPTIONS_START,
        };
        w.put(OPT_MESSAGE_TYPE, &[kind as u8]);
        w.put(OPT_SERVER_ID, &self.server);
        if kind != MessageType::Nak {
            w.put(OPT_LEASE_TIME, &LEASE_SECS.to_be_bytes());
            w.put(OPT_SUBNET_MASK, &[255, 255, 255, 0]);
            w.put(OPT_ROUTER, &self.server);
            w.put(OPT_DNS, &self.server);
        }
        w.buf[w.pos] = OPT_END;
        w.pos + 1
    }
}

struct OptionWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl OptionWriter<'_> {
    fn put(&mut self, code: u8, value: &[u8]) {
        self.buf[self.pos] = code;
        self.buf[self.pos + 1] = value.len() as u8;
        self.buf[self.pos + 2..self.pos + 2 + value.len()].copy_from_slice(value);
        self.pos += 2 + value.len();
    }
}

fn find_option(mut options: &[u8], code: u8) -> Option<&[u8]> {
    while let Some((&tag, rest)) = options.split_first() {
        match tag {
            OPT_END => return None,
            OPT_PAD => options = rest,
            _ => {
                let len = *rest.first()? as usize;
                let value = rest.get(1..1 + len)?;
                if tag == code {
                    return Some(value);
                }
                options = &rest[1 + len..];
            }
        }
    }
    None
}

/// Message type of a reply produced by [`DhcpServer::handle`].
pub fn reply_type(reply: &[u8]) -> Option<MessageType> {
    let options = reply.get(OPTIONS_START..)?;
    find_option(options, OPT_MESSAGE_TYPE)
        .and_then(|v| v.first().copied())
        .and_then(MessageType::from_u8)
}

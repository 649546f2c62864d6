//! Substrate storage keys and SS58 addresses for Subtensor queries.

use blake2::digest::consts::U16;
use blake2::{Blake2b, Blake2b512, Digest};
use std::hash::Hasher;
use twox_hash::XxHash64;

type Blake2b128 = Blake2b<U16>;

pub const SUBTENSOR_PALLET: &str = "SubtensorModule";
pub const TAO_DIVIDENDS_PER_SUBNET: &str = "TaoDividendsPerSubnet";

const SS58_PREFIX: &[u8] = b"SS58PRE";
const ACCOUNT_ID_LEN: usize = 32;
const CHECKSUM_LEN: usize = 2;

pub type AccountId = [u8; ACCOUNT_ID_LEN];

/// xxHash64 with seeds 0 and 1, little-endian, concatenated.
pub fn twox_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (seed, chunk) in out.chunks_exact_mut(8).enumerate() {
        let mut hasher = XxHash64::with_seed(seed as u64);
        hasher.write(data);
        chunk.copy_from_slice(&hasher.finish().to_le_bytes());
    }
    out
}

pub fn blake2_128(data: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Blake2b128::digest(data));
    out
}

pub fn blake2_128_concat(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + data.len());
    out.extend_from_slice(&blake2_128(data));
    out.extend_from_slice(data);
    out
}

/// Key of `SubtensorModule::TaoDividendsPerSubnet(netuid, hotkey)`.
///
/// The map is `StorageDoubleMap<Identity, u16, Blake2_128Concat, AccountId, u64>`.
pub fn tao_dividends_per_subnet_key(netuid: u16, hotkey: &AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 2 + 16 + ACCOUNT_ID_LEN);
    key.extend_from_slice(&twox_128(SUBTENSOR_PALLET.as_bytes()));
    key.extend_from_slice(&twox_128(TAO_DIVIDENDS_PER_SUBNET.as_bytes()));
    key.extend_from_slice(&netuid.to_le_bytes());
    key.extend_from_slice(&blake2_128_concat(hotkey));
    key
}

/// Decodes an SS58 address into its 32-byte account id.
///
/// Any network prefix is accepted. Returns `None` for anything that is not a
/// well-formed address with a valid checksum.
pub fn decode_ss58(address: &str) -> Option<AccountId> {
    let data = bs58::decode(address).into_vec().ok()?;

    let prefix_len = match *data.first()? {
        0..=63 => 1,
        64..=127 => 2,
        _ => return None,
    };
    if data.len() != prefix_len + ACCOUNT_ID_LEN + CHECKSUM_LEN {
        return None;
    }

    let (body, checksum) = data.split_at(data.len() - CHECKSUM_LEN);
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(body);
    let hash = hasher.finalize();
    if hash[..CHECKSUM_LEN] != *checksum {
        return None;
    }

    body[prefix_len..].try_into().ok()
}

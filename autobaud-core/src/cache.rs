//! Persistent cache of the last accepted framing
//!
//! A single flash slot holds one postcard-encoded [`CachedConfig`]. Saving
//! replaces the slot. Anything that fails to decode, carries the wrong
//! magic or schema, fails its CRC, or names an illegal framing is treated
//! as "no cache" and never trusted.

use serde::{Deserialize, Serialize};

use autobaud_hal::flash::{FlashError, FlashStorage, StorageKey};

use crate::candidate::FrameConfig;

/// Magic number identifying a cached link record
pub const CACHE_MAGIC: u32 = 0x4C4E4B43; // "LNKC"

/// Current record schema
pub const CACHE_SCHEMA_VERSION: u8 = 1;

/// Upper bound on the encoded record size
pub const MAX_CACHE_RECORD_SIZE: usize = 32;

/// Errors while loading or saving the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CacheError {
    /// Flash read/write error
    Flash(FlashError),
    /// Record did not fit the encode buffer
    Serialize,
    /// Stored bytes are not a record
    Deserialize,
    /// Wrong magic or schema version
    InvalidFormat,
    /// CRC does not match the contents
    CrcMismatch,
    /// Record fields do not form a legal framing
    InvalidCandidate,
}

impl From<FlashError> for CacheError {
    fn from(e: FlashError) -> Self {
        CacheError::Flash(e)
    }
}

/// Persisted link record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CachedConfig {
    /// Magic number for validation
    pub magic: u32,
    /// Record schema version
    pub schema_version: u8,
    pub baud_rate: u32,
    pub data_bits: u8,
    /// 0 = None, 1 = Even, 2 = Odd
    pub parity: u8,
    pub stop_bits: u8,
    /// CRC32 over magic..stop_bits
    pub crc: u32,
}

impl CachedConfig {
    /// Build a sealed record for a candidate
    pub fn new(config: &FrameConfig) -> Self {
        let mut record = Self {
            magic: CACHE_MAGIC,
            schema_version: CACHE_SCHEMA_VERSION,
            baud_rate: config.baud_rate(),
            data_bits: config.data_bits().bits(),
            parity: config.parity().code(),
            stop_bits: config.stop_bits().bits(),
            crc: 0,
        };
        record.update_crc();
        record
    }

    /// Check magic and schema version
    pub fn is_valid(&self) -> bool {
        self.magic == CACHE_MAGIC && self.schema_version == CACHE_SCHEMA_VERSION
    }

    /// Calculate CRC32 over every field except the CRC itself
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.schema_version]);
        crc = crc32_update(crc, &self.baud_rate.to_le_bytes());
        crc = crc32_update(crc, &[self.data_bits, self.parity, self.stop_bits]);
        !crc
    }

    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Checked conversion back to a candidate
    pub fn candidate(&self) -> Result<FrameConfig, CacheError> {
        if !self.is_valid() {
            return Err(CacheError::InvalidFormat);
        }
        if !self.verify_crc() {
            return Err(CacheError::CrcMismatch);
        }
        FrameConfig::from_raw(self.baud_rate, self.data_bits, self.parity, self.stop_bits)
            .map_err(|_| CacheError::InvalidCandidate)
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Single-slot framing cache on a flash store
pub struct ConfigCache<F> {
    storage: F,
}

impl<F: FlashStorage> ConfigCache<F> {
    pub fn new(storage: F) -> Self {
        Self { storage }
    }

    /// Load the cached candidate; any failure means "no cache"
    pub async fn load(&mut self) -> Option<FrameConfig> {
        match self.try_load().await {
            Ok(config) => {
                info!("Loaded cached link config {}", config);
                Some(config)
            }
            Err(CacheError::Flash(FlashError::NotFound)) => {
                debug!("No cached link config");
                None
            }
            Err(e) => {
                warn!("Ignoring cached link config: {:?}", e);
                None
            }
        }
    }

    /// Load with the failure reason
    pub async fn try_load(&mut self) -> Result<FrameConfig, CacheError> {
        let mut buffer = [0u8; MAX_CACHE_RECORD_SIZE];
        let len = self.storage.read(StorageKey::LinkConfig, &mut buffer).await?;

        let record: CachedConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| CacheError::Deserialize)?;

        record.candidate()
    }

    /// Replace the cached candidate
    pub async fn save(&mut self, config: &FrameConfig) -> Result<(), CacheError> {
        let record = CachedConfig::new(config);

        let mut buffer = [0u8; MAX_CACHE_RECORD_SIZE];
        let bytes = postcard::to_slice(&record, &mut buffer).map_err(|_| CacheError::Serialize)?;

        debug!("Saving {} bytes of link config", bytes.len());
        self.storage.write(StorageKey::LinkConfig, bytes).await?;

        info!("Saved link config {}", config);
        Ok(())
    }

    /// Erase the slot so the next start runs full detection
    pub async fn clear(&mut self) -> Result<(), CacheError> {
        match self.storage.remove(StorageKey::LinkConfig).await {
            Ok(()) | Err(FlashError::NotFound) => Ok(()),
            Err(e) => Err(CacheError::Flash(e)),
        }
    }

    pub fn storage_mut(&mut self) -> &mut F {
        &mut self.storage
    }

    pub fn into_inner(self) -> F {
        self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::{DataBits, Parity, StopBits};
    use crate::testing::MemoryFlash;
    use embassy_futures::block_on;

    fn frame() -> FrameConfig {
        FrameConfig::new(115200, DataBits::Eight, Parity::None, StopBits::One).unwrap()
    }

    fn store_record(flash: &mut MemoryFlash, record: &CachedConfig) {
        let mut buf = [0u8; MAX_CACHE_RECORD_SIZE];
        let bytes = postcard::to_slice(record, &mut buf).unwrap();
        flash.slots.insert(StorageKey::LinkConfig.as_u8(), bytes.to_vec());
    }

    #[test]
    fn test_save_then_load() {
        let mut cache = ConfigCache::new(MemoryFlash::default());
        block_on(cache.save(&frame())).unwrap();
        assert_eq!(block_on(cache.load()), Some(frame()));
    }

    #[test]
    fn test_save_overwrites() {
        let mut cache = ConfigCache::new(MemoryFlash::default());
        let other = FrameConfig::new(9600, DataBits::Seven, Parity::Even, StopBits::Two).unwrap();
        block_on(cache.save(&frame())).unwrap();
        block_on(cache.save(&other)).unwrap();
        assert_eq!(block_on(cache.load()), Some(other));
        assert_eq!(cache.storage_mut().slots.len(), 1);
    }

    #[test]
    fn test_missing_is_none() {
        let mut cache = ConfigCache::new(MemoryFlash::default());
        assert_eq!(block_on(cache.try_load()), Err(CacheError::Flash(FlashError::NotFound)));
        assert_eq!(block_on(cache.load()), None);
    }

    #[test]
    fn test_garbage_is_none() {
        let mut flash = MemoryFlash::default();
        flash.slots.insert(StorageKey::LinkConfig.as_u8(), std::vec![0xFF; 3]);
        let mut cache = ConfigCache::new(flash);
        assert_eq!(block_on(cache.try_load()), Err(CacheError::Deserialize));
        assert_eq!(block_on(cache.load()), None);
    }

    #[test]
    fn test_crc_mismatch_rejected() {
        let mut record = CachedConfig::new(&frame());
        record.baud_rate = 9600;
        let mut flash = MemoryFlash::default();
        store_record(&mut flash, &record);
        let mut cache = ConfigCache::new(flash);
        assert_eq!(block_on(cache.try_load()), Err(CacheError::CrcMismatch));
    }

    #[test]
    fn test_wrong_schema_rejected() {
        let mut record = CachedConfig::new(&frame());
        record.schema_version = 2;
        record.update_crc();
        let mut flash = MemoryFlash::default();
        store_record(&mut flash, &record);
        let mut cache = ConfigCache::new(flash);
        assert_eq!(block_on(cache.try_load()), Err(CacheError::InvalidFormat));
    }

    #[test]
    fn test_illegal_fields_rejected() {
        let mut record = CachedConfig::new(&frame());
        record.data_bits = 5;
        record.update_crc();
        let mut flash = MemoryFlash::default();
        store_record(&mut flash, &record);
        let mut cache = ConfigCache::new(flash);
        assert_eq!(block_on(cache.try_load()), Err(CacheError::InvalidCandidate));
    }

    #[test]
    fn test_clear() {
        let mut cache = ConfigCache::new(MemoryFlash::default());
        block_on(cache.save(&frame())).unwrap();
        block_on(cache.clear()).unwrap();
        assert_eq!(block_on(cache.load()), None);
        // Clearing an empty slot is fine
        block_on(cache.clear()).unwrap();
    }

    #[test]
    fn test_write_failure_reported() {
        let flash = MemoryFlash {
            fail_writes: true,
            ..MemoryFlash::default()
        };
        let mut cache = ConfigCache::new(flash);
        assert_eq!(
            block_on(cache.save(&frame())),
            Err(CacheError::Flash(FlashError::Flash))
        );
    }

    #[test]
    fn test_known_crc() {
        // Standard CRC32 check value
        assert_eq!(!crc32_update(0xFFFFFFFF, b"123456789"), 0xCBF43926);
    }
}

//! Protocol constants

use std::time::Duration;

/// Line terminator
pub const TERMINATOR: char = '\n';

/// Lines starting with this marker are device comments
pub const COMMENT_MARKER: char = '#';

/// Length of the hex checksum trailer
pub const CHECKSUM_LEN: usize = 4;

/// Shortest line that can carry a body and a checksum
pub const MIN_FRAME_LEN: usize = CHECKSUM_LEN + 1;

/// Bare link reset marker, sent without a checksum
pub const LINK_RESET: &[u8] = b"X\n";

/// Serial line speed; frames are 8N1 with no flow control
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default read timeout for a single frame
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default heartbeat period
pub const DEFAULT_HEARTBEAT_PERIOD: Duration = Duration::from_secs(5);

/// Default sleep between control loop ticks
pub const DEFAULT_IDLE_QUANTUM: Duration = Duration::from_millis(100);

/// Default wait after the link reset marker
pub const DEFAULT_SETTLE_PERIOD: Duration = Duration::from_secs(1);

/// Default silence that counts as a quiet link
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(100);

/// Keypad key that triggers the public-open unlock
pub const UNLOCK_KEY: &str = "#";

/// Seconds per override hour
pub const SECS_PER_HOUR: u64 = 3600;

/// Notification prefixes (device to controller)
pub mod notifications {
    /// Device log has new entries
    pub const EVENT_PENDING: char = 'E';

    /// Keypad press; the key is the third character
    pub const KEYPAD: char = 'Y';

    /// Position of the key within a keypad frame
    pub const KEYPAD_KEY_INDEX: usize = 2;
}

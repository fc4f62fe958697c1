//! Server-side Lua scripts for the Redis backend
//!
//! Each script performs the full read-check-update cycle for one algorithm
//! in a single round trip, so concurrent callers on the same key serialize
//! inside the store. Scripts return integers (1 = admitted, 0 = denied)
//! except the fixed-window script, which returns the updated count.

/// INCR the window row; set its TTL only when the increment created it.
pub const FIXED_WINDOW: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('EXPIRE', KEYS[1], tonumber(ARGV[1]))
end
return count
"#;

/// Sorted set of request timestamps; prune, count, append iff under limit.
pub const SLIDING_WINDOW_LOG: &str = r#"
local now = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local period = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', KEYS[1], 0, now - period)
local count = redis.call('ZCARD', KEYS[1])

if count < limit then
  redis.call('ZADD', KEYS[1], now, now .. '-' .. math.random())
  redis.call('EXPIRE', KEYS[1], math.ceil(period / 1000))
  return 1
end
return 0
"#;

/// Two adjacent bucket counters blended by how far the current bucket has
/// elapsed. The previous row keeps a shorter TTL since it only matters
/// until the current bucket ends.
pub const SLIDING_WINDOW_COUNTER: &str = r#"
local now = tonumber(ARGV[1])
local limit = tonumber(ARGV[2])
local bucket = tonumber(ARGV[3])

local current_window = math.floor(now / bucket) * bucket
local previous_window = current_window - bucket
local current_key = KEYS[1] .. ':' .. current_window
local previous_key = KEYS[1] .. ':' .. previous_window

local current_count = tonumber(redis.call('GET', current_key)) or 0
local previous_count = tonumber(redis.call('GET', previous_key)) or 0

local elapsed = (now - current_window) / bucket
local weighted = previous_count * (1 - elapsed) + current_count

if weighted < limit then
  redis.call('INCR', current_key)
  redis.call('EXPIRE', current_key, math.ceil(2 * bucket / 1000))
  if previous_count > 0 then
    redis.call('EXPIRE', previous_key, math.ceil(bucket / 1000))
  end
  return 1
end
return 0
"#;

/// Hash of (tokens, last_refill); refill, then consume one if available.
/// The hash is rewritten even on denial so the next refill sees the
/// correct elapsed time.
pub const TOKEN_BUCKET: &str = r#"
local now = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local refill_rate = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local state = redis.call('HMGET', KEYS[1], 'tokens', 'last_refill')
local tokens = tonumber(state[1])
local last_refill = tonumber(state[2])

if tokens == nil or last_refill == nil then
  tokens = capacity
  last_refill = now
else
  local elapsed = now - last_refill
  tokens = math.min(capacity, tokens + elapsed * refill_rate)
  last_refill = now
end

local allowed = 0
if tokens >= 1 then
  tokens = tokens - 1
  allowed = 1
end

redis.call('HSET', KEYS[1], 'tokens', tokens, 'last_refill', last_refill)
redis.call('EXPIRE', KEYS[1], ttl)
return allowed
"#;

/// Hash of (queue, last_process). Whole drained items advance
/// last_process by the time they consumed, keeping the fractional
/// remainder for the next call; a fully drained queue resets it to now.
pub const LEAKY_BUCKET: &str = r#"
local now = tonumber(ARGV[1])
local capacity = tonumber(ARGV[2])
local rate = tonumber(ARGV[3])
local ttl = tonumber(ARGV[4])

local state = redis.call('HMGET', KEYS[1], 'queue', 'last_process')
local queue = tonumber(state[1])
local last_process = tonumber(state[2])

if queue == nil or last_process == nil then
  queue = 0
  last_process = now
else
  local elapsed = (now - last_process) / 1000
  local processed = math.floor(elapsed * rate)
  if processed >= queue then
    queue = 0
    last_process = now
  elseif processed > 0 then
    queue = queue - processed
    last_process = last_process + (processed / rate) * 1000
  end
end

local allowed = 0
if queue < capacity then
  queue = queue + 1
  allowed = 1
end

redis.call('HSET', KEYS[1], 'queue', queue, 'last_process', last_process)
redis.call('EXPIRE', KEYS[1], ttl)
return allowed
"#;

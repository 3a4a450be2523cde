//! C5 — the idle sweeper. Runs after each multiplexer batch whenever a
//! positive idle timeout is configured. Because activity keeps a
//! connection's LRU position fresh, the walk from the head can stop at
//! the first still-active entry: everything after it is newer.

use std::time::{Duration, Instant};

use mio::Token;

use crate::conn::ConnectionTable;
use crate::mux::Multiplexer;

/// Closes every connection idle for at least `timeout`, starting from
/// the least-recently-active end of the list. `on_evict` lets the
/// caller run protocol-specific teardown (releasing a body store,
/// logging) before the slot is handed back for end-of-batch removal.
pub fn sweep<P>(
    table: &mut ConnectionTable<P>,
    mux: &Multiplexer,
    timeout: Duration,
    now: Instant,
    mut on_evict: impl FnMut(&mut ConnectionTable<P>, Token),
) {
    if timeout.is_zero() {
        return;
    }

    while let Some(token) = table.oldest() {
        let Some(conn) = table.get(token) else { break };
        if now.saturating_duration_since(conn.last_activity) < timeout {
            break;
        }
        let _ = mux.unregister(&mut table.get_mut(token).unwrap().stream);
        // Unlink before handing off to `on_evict`: it may free the slot
        // outright, and `remove()` never patches neighboring list
        // pointers, so unlinking has to happen while the entry is still
        // addressable or `head` is left dangling and every later sweep
        // breaks out on the first iteration.
        table.mark_closed(token);
        on_evict(table, token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conn::ConnectionTable;
    use std::net::{TcpListener as StdTcpListener, TcpStream as StdTcpStream};

    fn dummy_stream() -> mio::net::TcpStream {
        let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
        let client = StdTcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        server.set_nonblocking(true).unwrap();
        drop(client);
        mio::net::TcpStream::from_std(server)
    }

    #[test]
    fn zero_timeout_disables_sweeping() {
        let mux = Multiplexer::new(8).unwrap();
        let mut table: ConnectionTable<()> = ConnectionTable::new();
        let token = table.insert(dummy_stream(), "a".into(), ());
        mux.register(&mut table.get_mut(token).unwrap().stream, token, mio::Interest::READABLE).unwrap();

        sweep(&mut table, &mux, Duration::from_secs(0), Instant::now(), |t, tok| {
            t.remove(tok);
        });

        assert!(!table.is_closed(token));
    }

    #[test]
    fn evicts_connections_idle_past_the_timeout_and_stops_at_the_first_active_one() {
        let mux = Multiplexer::new(8).unwrap();
        let mut table: ConnectionTable<()> = ConnectionTable::new();
        let stale = table.insert(dummy_stream(), "a".into(), ());
        let fresh = table.insert(dummy_stream(), "b".into(), ());
        for token in [stale, fresh] {
            mux.register(&mut table.get_mut(token).unwrap().stream, token, mio::Interest::READABLE).unwrap();
        }

        let long_ago = Instant::now() - Duration::from_secs(3600);
        table.get_mut(stale).unwrap().last_activity = long_ago;

        let mut evicted = Vec::new();
        sweep(&mut table, &mux, Duration::from_secs(60), Instant::now(), |t, tok| {
            evicted.push(tok);
            t.remove(tok);
        });

        assert_eq!(evicted, vec![stale]);
        assert!(!table.contains(stale));
        assert!(table.contains(fresh));
        assert!(!table.is_closed(fresh));
    }

    /// Regression test: a prior version of `sweep` called `on_evict`
    /// (which may free the slab slot) before unlinking from the LRU
    /// list, leaving `head` pointing at a freed key and silently
    /// breaking out of the sweep on the very first eviction. With two
    /// stale entries both must be evicted, proving the loop keeps going
    /// instead of bailing out after the first `remove()`.
    #[test]
    fn evicts_all_stale_entries_even_when_on_evict_frees_the_slot() {
        let mux = Multiplexer::new(8).unwrap();
        let mut table: ConnectionTable<()> = ConnectionTable::new();
        let stale_a = table.insert(dummy_stream(), "a".into(), ());
        let stale_b = table.insert(dummy_stream(), "b".into(), ());
        let fresh = table.insert(dummy_stream(), "c".into(), ());
        for token in [stale_a, stale_b, fresh] {
            mux.register(&mut table.get_mut(token).unwrap().stream, token, mio::Interest::READABLE).unwrap();
        }

        let long_ago = Instant::now() - Duration::from_secs(3600);
        table.get_mut(stale_a).unwrap().last_activity = long_ago;
        table.get_mut(stale_b).unwrap().last_activity = long_ago;

        let mut evicted = Vec::new();
        sweep(&mut table, &mux, Duration::from_secs(60), Instant::now(), |t, tok| {
            evicted.push(tok);
            t.remove(tok);
        });

        assert_eq!(evicted, vec![stale_a, stale_b]);
        assert!(!table.contains(stale_a));
        assert!(!table.contains(stale_b));
        assert!(table.contains(fresh));
        assert!(!table.is_closed(fresh));
    }
}

use actix::prelude::Addr;
use tokio::timer::Interval;
use std::time::{Duration, Instant};
use tokio::prelude::future::Future;
use tokio::prelude::Stream;

use eventyay_attendees::controller::{AttendeesController, LoadAttendees};

/// Forces a reload every `seconds`, starting right away.
pub fn refresh_interval(seconds: u64, addr: Addr<AttendeesController>) -> impl Future<Item=(), Error=()> + 'static {
    Interval::new(Instant::now(), Duration::from_secs(seconds))
        .map_err(|err| error!("Attendees refresh timer failed : {}", err))
        .for_each(move |_instant| {
            debug!("Refreshing attendees");
            addr.do_send(LoadAttendees { force_reload: true });
            Ok(())
        })
}

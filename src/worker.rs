use std::{
    io::{
        Error,
        ErrorKind,
        Result,
    },
    panic::{
        catch_unwind,
        RefUnwindSafe,
        UnwindSafe,
    },
    process::abort,
};

use tokio::sync::mpsc::{
    error::TrySendError,
    Sender,
};

pub trait TrySend: UnwindSafe + RefUnwindSafe {
    fn sender(&self) -> &Sender<String>;

    fn try_send(&self, msg: String) -> Result<()> {
        // self.tx is !RefUnwindSafe -- don't let it panic!
        let wrapped = catch_unwind(|| self.sender().try_send(msg));

        match wrapped {
            Ok(res) => {
                if let Err(e) = res {
                    let kind = match e {
                        TrySendError::Full(_) => ErrorKind::WouldBlock,
                        TrySendError::Closed(_) => ErrorKind::Other,
                    };

                    return Err(Error::new(kind, e.to_string()));
                }
            }

            Err(e) => {
                eprintln!("panic while attempting to enqueue statsd metric: {:?}", e);
                abort();
            }
        }

        Ok(())
    }
}

/// Defines `worker`, the future that drains a queue of messages and sends each one as
/// its own datagram on the given socket type.
#[macro_export]
#[doc(hidden)]
macro_rules! define_worker {
    ($SocketType:ty, $TargetType:ty) => {
        $crate::define_worker!($SocketType, $TargetType, &$TargetType);
    };

    ($SocketType:ty, $TargetType:ty, $TargetTypeRef:ty) => {
        async fn do_send(socket: &$SocketType, addr: $TargetTypeRef, msg: &str) {
            use ::log::*;

            match socket.send_to(msg.as_bytes(), addr).await {
                Ok(n) => {
                    trace!("sent {} bytes", n);
                }

                Err(e) => {
                    error!("failed to send metric: {:?}", e);
                }
            }
        }

        async fn worker(
            mut rx: ::tokio::sync::mpsc::Receiver<String>,
            socket: $SocketType,
            addr: $TargetType,
        ) {
            use ::log::*;

            while let Some(msg) = rx.recv().await {
                trace!("write: {}", msg);
                do_send(&socket, &addr, &msg).await;
            }

            debug!("stop");
        }
    };
}

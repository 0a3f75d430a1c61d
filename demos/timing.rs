use log::*;
use statsd_emitter::{Client, Options, TokioUdpMetricSink};
use std::{
    error::Error,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::{
    net::UdpSocket,
    spawn,
    time::{sleep, Duration},
};

const NUM_TASKS: usize = 10;
const NUM_LOOPS: usize = 100;
const WORK_DELAY: Duration = Duration::from_millis(1);
const COUNT_METRIC: &str = "demo.success";
const TIMER_METRIC: &str = "demo.duration";
const SAMPLED_TIMER_METRIC: &str = "demo.duration.sampled";
const CATCHUP_DELAY: Duration = Duration::from_secs(1);

async fn run(client: Client) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let mut tasks = Vec::with_capacity(NUM_TASKS);

    for _ in 0..NUM_TASKS {
        let client = client.clone();
        let task = spawn(async move {
            let mut timer = client.timer();
            for _ in 0..NUM_LOOPS {
                timer.reset();
                sleep(WORK_DELAY).await;

                timer.send([TIMER_METRIC]);
                timer.send_with_options(&Options::sampled(0.25), [SAMPLED_TIMER_METRIC]);
                client.incr(COUNT_METRIC);
            }
        });

        tasks.push(task);
    }

    for task in tasks {
        task.await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    pretty_env_logger::init();

    let client_socket = UdpSocket::bind("127.0.0.1:0").await?;
    let server_socket = UdpSocket::bind("127.0.0.1:0").await?;
    let server_addr = server_socket.local_addr()?;

    let recv_count = Arc::new(AtomicUsize::default());
    let recv_count_clone = recv_count.clone();

    spawn(async move {
        let mut buf = [0; 8192];

        while let Ok((n, _)) = server_socket.recv_from(&mut buf).await {
            let line = String::from_utf8_lossy(&buf[..n]);
            debug!("data: {}", line);

            if let Some((name, rest)) = line.split_once(':') {
                if name == COUNT_METRIC && rest.ends_with("|c") {
                    recv_count.fetch_add(1, Ordering::AcqRel);
                }
            }
        }
    });

    let (sink, process) = TokioUdpMetricSink::from(server_addr, client_socket)?;
    let processing_job = spawn(process);

    let client = Client::builder().sink(sink).build()?;
    info!("reporting as {}", client.host());

    run(client).await?;

    processing_job.await?;

    sleep(CATCHUP_DELAY).await;

    info!("sent count: {}", NUM_TASKS * NUM_LOOPS);
    info!(
        "received count: {}",
        recv_count_clone.load(Ordering::Acquire)
    );

    Ok(())
}

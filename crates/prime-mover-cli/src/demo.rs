//! `prime-mover demo`: run the bundled single-server queue scenario and
//! print its report, mirroring `durable-cli`'s `launch` subcommand —
//! except there is no remote cluster to submit a workflow to, since a
//! Prime Mover model is a Rust crate linked directly into whatever
//! binary drives it, not a guest artifact shipped to a host at runtime.
//! This subcommand exists so the CLI has something runnable on its own
//! rather than only ever reformatting a report another binary produced;
//! see `demos/hello-world` for the macro-driven version of the same
//! model.

use std::sync::{Arc, Mutex};

use prime_mover_core::{Config, Devi, Entity, EntityHandle, Outcome, SimulationController, Time};

#[derive(Debug, clap::Args)]
pub struct Demo {
    /// Number of customers to run through the single-server queue.
    #[arg(long, default_value_t = 10)]
    customers: u32,

    /// Inter-arrival gap between customers, in ticks.
    #[arg(long, default_value_t = 10)]
    arrival_gap: i64,

    /// Service duration per customer, in ticks.
    #[arg(long, default_value_t = 15)]
    service_time: u64,

    /// Emit the resulting report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

impl Demo {
    pub fn run(&self) -> anyhow::Result<()> {
        // Written directly against `prime-mover-core` rather than the
        // `#[entity]` macro, so this subcommand has no dependency on the
        // macro crate's generated code; `demos/hello-world` shows the
        // macro-driven version of the same single-server queue.
        let mut controller = SimulationController::new("demo", Config::new());

        let in_use = Arc::new(Mutex::new(false));
        let waiting = Arc::new(Mutex::new(0usize));
        let served = Arc::new(Mutex::new(0u32));
        let signal = Arc::new(Mutex::new(prime_mover_core::Signal::new()));

        struct Arrival {
            service_time: u64,
            in_use: Arc<Mutex<bool>>,
            waiting: Arc<Mutex<usize>>,
            served: Arc<Mutex<u32>>,
            signal: Arc<Mutex<prime_mover_core::Signal>>,
        }

        impl Entity for Arrival {
            fn invoke(&self, _ordinal: usize, _args: prime_mover_core::Arguments, devi: &mut Devi) -> Result<Outcome, anyhow::Error> {
                let mut in_use = self.in_use.lock().unwrap();
                if *in_use {
                    *self.waiting.lock().unwrap() += 1;
                    let waiting = Arc::clone(&self.waiting);
                    let served = Arc::clone(&self.served);
                    let service_time = self.service_time;
                    drop(in_use);
                    return self.signal.lock().unwrap().wait(
                        devi,
                        Box::new(move |devi, _outcome| {
                            *waiting.lock().unwrap() -= 1;
                            devi.advance(
                                service_time,
                                Box::new(move |_devi, _outcome| {
                                    *served.lock().unwrap() += 1;
                                    Ok(Outcome::Done(None))
                                }),
                            );
                            Ok(Outcome::Done(None))
                        }),
                    );
                }
                *in_use = true;
                drop(in_use);
                let in_use = Arc::clone(&self.in_use);
                let waiting = Arc::clone(&self.waiting);
                let served = Arc::clone(&self.served);
                let signal = Arc::clone(&self.signal);
                Ok(devi.advance(
                    self.service_time,
                    Box::new(move |devi, _outcome| {
                        *served.lock().unwrap() += 1;
                        let mut sig = signal.lock().unwrap();
                        if *waiting.lock().unwrap() > 0 {
                            sig.signal(devi, None);
                        } else {
                            *in_use.lock().unwrap() = false;
                        }
                        Ok(Outcome::Done(None))
                    }),
                ))
            }

            fn signature_for(&self, _ordinal: usize) -> &'static str {
                "Arrival::arrive"
            }

            fn type_name(&self) -> &'static str {
                "Arrival"
            }
        }

        let handle: EntityHandle = Arc::new(Arrival {
            service_time: self.service_time,
            in_use: Arc::clone(&in_use),
            waiting: Arc::clone(&waiting),
            served: Arc::clone(&served),
            signal: Arc::clone(&signal),
        });

        for customer in 0..self.customers {
            let time = Time::from_ticks(i64::from(customer) * self.arrival_gap);
            controller.post_event_at(time, Arc::clone(&handle), 0, Vec::new())?;
        }

        let report = controller.event_loop()?;
        if self.json {
            println!("{}", report.to_json()?);
        } else {
            print!("{report}");
        }
        Ok(())
    }
}

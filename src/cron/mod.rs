pub mod jobs;
mod scheduler;

pub use scheduler::CronScheduler;

mod cpu_pipeline;
mod raw_dumps;
mod scan_completeness;
mod scenarios;

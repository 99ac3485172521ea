mod cache;
mod host;
mod marshal;
mod packing;

mod entries;
mod web;

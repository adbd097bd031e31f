pub mod gtid;

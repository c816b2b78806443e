/// Declarative macro for defining syscall handlers.
///
/// # Syntax
///
/// ```ignore
/// define_syscall!(handler_name(ctx, args) { body });
/// ```
///
/// The body sees `ctx: &SyscallContext` and `args: &SyscallArgs` and
/// evaluates to a `SyscallResult`, so `?` works on anything that converts
/// into `SyscallError`.
#[macro_export]
macro_rules! define_syscall {
    ($name:ident($ctx:ident, $args:ident) $body:block) => {
        pub fn $name(
            $ctx: &$crate::syscall::context::SyscallContext<'_>,
        ) -> $crate::syscall::common::SyscallResult {
            #[allow(unused_variables)]
            let $args = $ctx.args();
            $body
        }
    };
}

/// Fail with `EFAULT` when a user pointer argument is null.
#[macro_export]
macro_rules! require_nonzero {
    ($val:expr) => {
        if $val == 0 {
            return Err($crate::syscall::common::SyscallError::Fault);
        }
    };
}

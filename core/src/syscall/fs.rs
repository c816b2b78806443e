use kfd_abi::fs::{OpenFlags, UserFileStat};

use crate::syscall::common::{
    USER_IO_MAX_BYTES, USER_PATH_MAX, syscall_bounded_from_user, syscall_copy_user_path,
};

define_syscall!(syscall_fs_open(ctx, args) {
    let mut path_buf = [0u8; USER_PATH_MAX];
    let path = syscall_copy_user_path(ctx.user(), &mut path_buf, args.arg0)?;
    let flags = OpenFlags::from_bits_retain(args.arg1_u32());
    let fd = ctx.files().open(ctx.fds(), path, flags, args.arg2_u32())?;
    Ok(fd as u64)
});

define_syscall!(syscall_fs_close(ctx, args) {
    ctx.files().close(ctx.fds(), args.arg0_fd())?;
    Ok(0)
});

define_syscall!(syscall_fs_read(ctx, args) {
    require_nonzero!(args.arg1);

    let mut tmp = [0u8; USER_IO_MAX_BYTES];
    let capped_len = args.arg2_usize().min(USER_IO_MAX_BYTES);

    let bytes = ctx.files().read(ctx.fds(), args.arg0_fd(), &mut tmp[..capped_len])?;
    ctx.user().copy_to_user(args.arg1, &tmp[..bytes])?;
    Ok(bytes as u64)
});

define_syscall!(syscall_fs_write(ctx, args) {
    require_nonzero!(args.arg1);

    let mut tmp = [0u8; USER_IO_MAX_BYTES];
    let write_len = syscall_bounded_from_user(ctx.user(), &mut tmp, args.arg1, args.arg2)?;

    let bytes = ctx.files().write(ctx.fds(), args.arg0_fd(), &tmp[..write_len])?;
    Ok(bytes as u64)
});

define_syscall!(syscall_lseek(ctx, args) {
    // A whence that does not fit in 32 bits is as invalid as any other.
    let whence = u32::try_from(args.arg2).unwrap_or(u32::MAX);
    let offset = ctx.files().lseek(ctx.fds(), args.arg0_fd(), args.arg1_i64(), whence)?;
    Ok(offset as u64)
});

define_syscall!(syscall_fstat(ctx, args) {
    require_nonzero!(args.arg1);

    let stat = ctx.files().fstat(ctx.fds(), args.arg0_fd())?;
    let user_stat = UserFileStat::from(&stat);
    ctx.user().copy_to_user(args.arg1, &user_stat.to_bytes())?;
    Ok(0)
});

define_syscall!(syscall_dup(ctx, args) {
    let fd = ctx.files().dup(ctx.fds(), args.arg0_fd())?;
    Ok(fd as u64)
});

define_syscall!(syscall_dup2(ctx, args) {
    let fd = ctx.files().dup2(ctx.fds(), args.arg0_fd(), args.arg1_fd())?;
    Ok(fd as u64)
});
